//! Authentication vector integration tests
//!
//! One shared parameter block driving many concurrent generations, and
//! randomized checks of the individual functions against the combined one.

use std::sync::Arc;

use nextgcore_udm_keytool::AuthVectorGenerator;
use ogs_crypt::milenage256::{
    milenage256_f1, milenage256_f1_star, milenage256_f2, milenage256_f3, milenage256_f4,
    milenage256_f5, milenage256_f5_star, milenage256_f5_star_star, milenage256_generate,
    milenage256_opc,
};
use proptest::prelude::*;

use crate::common::TestSubscriber;

#[test]
fn test_parallel_generation_matches_sequential() {
    let _ = env_logger::try_init();
    let sub = TestSubscriber::test_set_4d();
    let generator = AuthVectorGenerator::new(sub.milenage_config());
    let key = hex::decode(sub.ki).unwrap();
    let sqn = hex::decode(sub.sqn).unwrap();
    let amf = hex::decode(sub.amf).unwrap();

    let rands: Vec<[u8; 16]> = (0u8..100)
        .map(|i| {
            let mut rand = [0u8; 16];
            rand[0] = i;
            rand[15] = i.wrapping_mul(31);
            rand
        })
        .collect();

    let sequential: Vec<_> = rands
        .iter()
        .map(|rand| generator.generate(&key, rand, &sqn, &amf).unwrap())
        .collect();

    let parallel: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = rands
            .iter()
            .map(|rand| {
                let generator = &generator;
                let (key, sqn, amf) = (&key, &sqn, &amf);
                s.spawn(move || generator.generate(key, rand, sqn, amf).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(parallel, sequential);
    assert_eq!(hex::encode(&sequential[0].res).len(), 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_vector_generation_from_async_tasks() {
    let _ = env_logger::try_init();
    let sub = TestSubscriber::test_set_4d();
    let generator = Arc::new(AuthVectorGenerator::new(sub.milenage_config()));

    let mut tasks = Vec::new();
    for _ in 0..32 {
        let generator = generator.clone();
        let sub = sub.clone();
        tasks.push(tokio::task::spawn_blocking(move || {
            let key = hex::decode(sub.ki).unwrap();
            generator
                .generate_hex(&key, None, sub.rand, sub.sqn, sub.amf)
                .unwrap()
        }));
    }

    for task in tasks {
        let av = task.await.unwrap();
        assert_eq!(av.mac_a, sub.expected.mac_a);
        assert_eq!(av.ak, sub.expected.ak);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Each function alone yields the same bytes as the combined generation
    #[test]
    fn prop_individual_functions_match_generate(
        key in proptest::array::uniform32(any::<u8>()),
        rand in proptest::array::uniform16(any::<u8>()),
        sqn in proptest::array::uniform6(any::<u8>()),
        amf in proptest::array::uniform2(any::<u8>()),
    ) {
        let cfg = TestSubscriber::test_set_4d().milenage_config();
        let av = milenage256_generate(&cfg, &key, &rand, &sqn, &amf).unwrap();
        let opc = milenage256_opc(&cfg, &key).unwrap();

        prop_assert_eq!(opc, av.opc);
        prop_assert_eq!(milenage256_f1(&cfg, &opc, &key, &rand, &sqn, &amf).unwrap(), av.mac_a.clone());
        prop_assert_eq!(milenage256_f1_star(&cfg, &opc, &key, &rand, &sqn, &amf).unwrap(), av.mac_s.clone());
        prop_assert_eq!(milenage256_f2(&cfg, &opc, &key, &rand).unwrap(), av.res.clone());
        prop_assert_eq!(milenage256_f3(&cfg, &opc, &key, &rand).unwrap(), av.ck.clone());
        prop_assert_eq!(milenage256_f4(&cfg, &opc, &key, &rand).unwrap(), av.ik.clone());
        prop_assert_eq!(milenage256_f5(&cfg, &opc, &key, &rand).unwrap(), av.ak.clone());
        prop_assert_eq!(milenage256_f5_star(&cfg, &opc, &key, &rand).unwrap(), av.ak_star.clone());
    }

    /// f5** depends on MAC-S; f5 and f5* do not
    #[test]
    fn prop_f5_star_star_follows_mac_s(
        key in proptest::array::uniform32(any::<u8>()),
        rand in proptest::array::uniform16(any::<u8>()),
        mac_s in proptest::array::uniform8(any::<u8>()),
        flip in 0usize..8,
    ) {
        let cfg = TestSubscriber::test_set_4d().milenage_config();
        let opc = milenage256_opc(&cfg, &key).unwrap();

        let mut other = mac_s;
        other[flip] ^= 0x01;
        let a = milenage256_f5_star_star(&cfg, &opc, &key, &rand, &mac_s).unwrap();
        let b = milenage256_f5_star_star(&cfg, &opc, &key, &rand, &other).unwrap();
        prop_assert_eq!(a.len(), cfg.ak_size);
        prop_assert_ne!(a, b);
    }
}
