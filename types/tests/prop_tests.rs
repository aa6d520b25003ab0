use proptest::prelude::*;

use groundtruth_types::{
    ContentHash, GeoCell, GeoPoint, PreviousHash, Timestamp, VoteChoice, VoteTally,
};

fn point() -> impl Strategy<Value = GeoPoint> {
    (-89.0f64..89.0, -180.0f64..180.0).prop_map(|(lat, long)| GeoPoint::new(lat, long).unwrap())
}

proptest! {
    /// Hex parsing accepts exactly what Display produces.
    #[test]
    fn content_hash_hex_is_canonical(bytes in prop::array::uniform32(0u8..)) {
        let hash = ContentHash::new(bytes);
        let hex = hash.to_string();
        prop_assert_eq!(hex.len(), 64);
        prop_assert_eq!(ContentHash::from_hex(&hex).unwrap(), hash);
        let link: PreviousHash = hex.parse().unwrap();
        prop_assert_eq!(link, PreviousHash::Hash(hash));
    }

    /// Big-endian timestamp bytes sort the same way the timestamps do.
    #[test]
    fn timestamp_bytes_preserve_order(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::from_millis(a);
        let tb = Timestamp::from_millis(b);
        prop_assert_eq!(ta.to_be_bytes() <= tb.to_be_bytes(), ta <= tb);
        prop_assert_eq!(Timestamp::from_be_bytes(ta.to_be_bytes()), ta);
    }

    /// Distance is symmetric and non-negative.
    #[test]
    fn distance_is_symmetric(a in point(), b in point()) {
        let ab = a.distance_meters(&b);
        let ba = b.distance_meters(&a);
        prop_assert!(ab >= 0.0);
        prop_assert!((ab - ba).abs() < 1e-6);
    }

    /// Every point inside the radius lies in one of the covering cells.
    #[test]
    fn covering_contains_every_point_in_radius(
        center in point(),
        bearing in 0.0f64..std::f64::consts::TAU,
        radius in 1.0f64..20_000.0,
        fraction in 0.0f64..1.0,
    ) {
        // Offset the center by `fraction * radius` along `bearing`.
        let delta = fraction * radius / groundtruth_types::EARTH_RADIUS_METERS;
        let phi1 = center.lat().to_radians();
        let lambda1 = center.long().to_radians();
        let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * bearing.cos()).asin();
        let y = bearing.sin() * delta.sin() * phi1.cos();
        let x = delta.cos() - phi1.sin() * phi2.sin();
        let lambda2 = lambda1 + y.atan2(x);
        let mut long = lambda2.to_degrees();
        if long > 180.0 { long -= 360.0; }
        if long < -180.0 { long += 360.0; }
        let target = GeoPoint::new(phi2.to_degrees().clamp(-90.0, 90.0), long).unwrap();

        prop_assume!(target.within(&center, radius));
        if let Some(cells) = GeoCell::covering(&center, radius) {
            prop_assert!(cells.contains(&GeoCell::containing(&target)));
        }
    }

    /// Verify and dispute shares never exceed the whole.
    #[test]
    fn tally_shares_bounded(verify in 0u32..10_000, dispute in 0u32..10_000) {
        let tally = VoteTally { verify, dispute };
        let sum = tally.share_bps(VoteChoice::Verify) + tally.share_bps(VoteChoice::Dispute);
        prop_assert!(sum <= 10_000);
        if tally.total() > 0 {
            prop_assert!(sum >= 9_998);
        }
    }
}
