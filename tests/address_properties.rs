#[cfg(test)]
mod address_properties {
    use subnet_planner::hierarchy::{DynamicSubnetCalculator, HierarchyConfig, LevelSpec, SubnetHierarchy};
    use subnet_planner::ip::{
        address_count, address_to_integer, broadcast, contains, integer_to_address, network, nth_subnet, parse_cidr,
        subnet_count, usable_hosts,
    };

    #[test]
    fn test_address_count_and_usable_hosts_for_every_prefix() {
        for p in 0..=32u8 {
            assert_eq!(address_count(p), 1u64 << (32 - p), "address_count(/{})", p);
            let expected = match p {
                32 => 1,
                31 => 2,
                _ => address_count(p) - 2,
            };
            assert_eq!(usable_hosts(p), expected, "usable_hosts(/{})", p);
        }
    }

    #[test]
    fn test_dotted_quad_round_trip() {
        // Walk a spread of addresses across the whole space
        let mut value: u32 = 0;
        loop {
            let dotted = integer_to_address(value);
            assert_eq!(address_to_integer(&dotted).unwrap(), value);
            match value.checked_add(0x0101_0101 + 7919) {
                Some(next) => value = next,
                None => break,
            }
        }
        assert_eq!(integer_to_address(address_to_integer("255.255.255.255").unwrap()), "255.255.255.255");
    }

    #[test]
    fn test_network_and_broadcast_bound_every_block() {
        let samples = ["0.0.0.0/0", "10.0.0.0/8", "172.16.5.4/12", "192.168.1.1/31", "8.8.8.8/32", "100.64.3.0/22"];
        for cidr in samples {
            let block = parse_cidr(cidr).unwrap();
            let net = network(block.network(), block.prefix());
            let bcast = broadcast(block.network(), block.prefix());
            assert!(net <= bcast);
            assert!(contains(&integer_to_address(net), cidr), "{} network", cidr);
            assert!(contains(&integer_to_address(bcast), cidr), "{} broadcast", cidr);
        }
    }

    #[test]
    fn test_nth_subnets_partition_parent() {
        let cases = [("10.0.0.0/8", 12u8), ("192.168.0.0/24", 28), ("172.16.0.0/12", 12), ("0.0.0.0/0", 4)];
        for (cidr, child) in cases {
            let parent = parse_cidr(cidr).unwrap();
            let count = subnet_count(parent.prefix(), child).unwrap();

            let mut expected_start = u64::from(parent.network());
            let mut previous = None;
            for i in 0..count {
                let subnet = nth_subnet(parent.network(), parent.prefix(), child, i).unwrap();
                // Contiguous in index order means pairwise disjoint
                assert_eq!(u64::from(subnet.network()), expected_start);
                if let Some(prev) = previous {
                    assert!(!subnet.overlaps(&prev));
                }
                expected_start = subnet.end();
                previous = Some(subnet);
            }
            assert_eq!(expected_start, parent.end(), "{} not covered exactly", cidr);
            assert!(nth_subnet(parent.network(), parent.prefix(), child, count).is_err());
        }
    }

    #[test]
    fn test_hierarchy_and_calculator_agree() {
        let hierarchy = SubnetHierarchy::new(&HierarchyConfig {
            root: "10.20.0.0/16".to_string(),
            levels: vec![LevelSpec::new("site", 20), LevelSpec::new("vlan", 24)],
        })
        .unwrap();
        let calculator = DynamicSubnetCalculator::new("10.20.0.0/16", 24).unwrap();

        let vlan_level = &hierarchy.level_summaries()[1];
        let snapshot = calculator.snapshot();
        assert_eq!(vlan_level.subnet_count, snapshot.vlan_count);
        assert_eq!(vlan_level.total_addresses, snapshot.total_addresses);
        assert_eq!(vlan_level.mean_usable_hosts as u64, snapshot.usable_hosts_per_vlan);
        assert_eq!(hierarchy.nodes().count() as u64, hierarchy.node_count());
    }
}
