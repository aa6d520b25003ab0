#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use groundtruth_query::{QueryParams, ReportQuery};

#[derive(Arbitrary, Debug)]
struct Input {
    status: Option<String>,
    lat: Option<String>,
    long: Option<String>,
    radius: Option<String>,
}

fuzz_target!(|input: Input| {
    let params = QueryParams {
        status: input.status,
        lat: input.lat,
        long: input.long,
        radius: input.radius,
    };
    if let Ok(query) = ReportQuery::from_params(&params) {
        if let Some(near) = &query.near {
            assert!(near.radius_meters().is_finite());
            assert!(near.radius_meters() > 0.0);
        }
        let _ = query.to_filter();
    }
});
