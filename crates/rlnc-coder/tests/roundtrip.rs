use proptest::prelude::*;
use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};
use rlnc_coder::{CoderConfig, Decoder, DecoderState, Encoder, Payload};
use rlnc_math::CodingMatrix;

fn shuffle<T>(items: &mut [T], rng: &mut ChaCha20Rng) {
    for i in (1..items.len()).rev() {
        let j = (rng.next_u32() as usize) % (i + 1);
        items.swap(i, j);
    }
}

/// Picks payloads from `candidates` until `k` independent ones are held.
fn independent_set(candidates: Vec<Payload>, k: usize) -> Vec<Payload> {
    let mut chosen: Vec<Payload> = Vec::with_capacity(k);
    for p in candidates {
        if chosen.len() == k {
            break;
        }
        let mut rows: Vec<&[u8]> = chosen.iter().map(|c| c.coefficients()).collect();
        rows.push(p.coefficients());
        if CodingMatrix::from_rows(&rows, k).unwrap().rank() == rows.len() {
            chosen.push(p);
        }
    }
    chosen
}

#[test]
fn test_systematic_scenario() {
    let cfg = CoderConfig::new(4, 2).unwrap();
    let data = [1u8, 2, 3, 4, 5, 6, 7, 8];

    let mut enc = Encoder::with_seed(cfg, 11);
    enc.set_symbols(&data).unwrap();
    let mut dec = Decoder::with_seed(cfg, 12);

    for reads in 1..=4 {
        assert!(!dec.is_complete());
        let p = enc.write_payload().unwrap();
        assert!(dec.read_payload(&p));
        assert_eq!(dec.rank(), reads);
    }
    assert!(dec.is_complete());
    assert_eq!(dec.copy_symbols(), data.to_vec());
}

#[test]
fn test_coded_only_scenario() {
    let cfg = CoderConfig::new(4, 2).unwrap();
    let data = [1u8, 2, 3, 4, 5, 6, 7, 8];

    let mut enc = Encoder::with_seed(cfg, 21);
    enc.set_symbols(&data).unwrap();

    // Drop every systematic payload.
    for _ in 0..4 {
        let p = enc.write_payload().unwrap();
        assert!(p.systematic_index().is_some());
    }
    let coded: Vec<Payload> = (0..16).map(|_| enc.write_payload().unwrap()).collect();
    let picked = independent_set(coded, 4);
    assert_eq!(picked.len(), 4);

    let mut dec = Decoder::with_seed(cfg, 22);
    for (i, p) in picked.iter().enumerate() {
        assert!(!dec.is_complete(), "complete early after {} reads", i);
        assert!(dec.read_payload(p));
    }
    assert!(dec.is_complete());
    assert_eq!(dec.payloads_read(), 4);
    assert_eq!(dec.copy_symbols(), data.to_vec());
}

#[test]
fn test_coded_before_systematic() {
    let cfg = CoderConfig::new(10, 44).unwrap();
    let mut data = vec![0u8; cfg.block_size()];
    ChaCha20Rng::seed_from_u64(73).fill_bytes(&mut data);

    let mut enc = Encoder::with_seed(cfg, 73);
    enc.set_symbols(&data).unwrap();
    let systematic: Vec<Payload> = (0..10).map(|_| enc.write_payload().unwrap()).collect();

    // Three coded rows claim low columns before any uncoded symbol shows up.
    let mut dec = Decoder::with_seed(cfg, 74);
    for _ in 0..3 {
        assert!(dec.read_payload(&enc.write_payload().unwrap()));
    }
    let mut innovative = 0;
    for p in &systematic {
        if dec.read_payload(p) {
            innovative += 1;
        }
    }
    assert_eq!(innovative, 7);
    assert!(dec.is_complete());
    assert_eq!(dec.copy_symbols(), data);
}

#[test]
fn test_systematic_coverage_order() {
    let cfg = CoderConfig::new(16, 8).unwrap();
    let mut enc = Encoder::with_seed(cfg, 5);
    let mut data = vec![0u8; cfg.block_size()];
    ChaCha20Rng::seed_from_u64(5).fill_bytes(&mut data);
    enc.set_symbols(&data).unwrap();

    for i in 0..16 {
        assert!(enc.in_systematic_phase());
        let p = enc.write_payload().unwrap();
        assert_eq!(p.systematic_index(), Some(i));
        assert_eq!(p.symbol(), &data[i * 8..(i + 1) * 8]);
    }
    assert!(!enc.in_systematic_phase());
    assert_eq!(enc.write_payload().unwrap().coefficients().len(), 16);
}

#[test]
fn test_redundant_payloads_ignored() {
    let cfg = CoderConfig::new(8, 32).unwrap();
    let mut data = vec![0u8; cfg.block_size()];
    ChaCha20Rng::seed_from_u64(9).fill_bytes(&mut data);

    let mut enc = Encoder::with_seed(cfg, 9);
    enc.set_symbols(&data).unwrap();
    let mut dec = Decoder::with_seed(cfg, 10);

    let first = enc.write_payload().unwrap();
    assert!(dec.read_payload(&first));
    let before = dec.copy_symbols();

    // Same unit vector again, even with different data, changes nothing.
    let mut tampered = first.symbol().to_vec();
    tampered[0] ^= 0xFF;
    assert!(!dec.read_payload(&first));
    assert!(!dec.read_payload(&Payload::systematic(8, 0, &tampered).unwrap()));
    assert_eq!(dec.rank(), 1);
    assert_eq!(dec.copy_symbols(), before);

    // A scaled copy of a coded payload is dependent too.
    enc.set_systematic_off();
    let coded = enc.write_payload().unwrap();
    assert!(dec.read_payload(&coded));
    let mut coefficients = coded.coefficients().to_vec();
    let mut symbol = coded.symbol().to_vec();
    rlnc_math::row_scale(&mut coefficients, rlnc_math::Gf256(0x35));
    rlnc_math::row_scale(&mut symbol, rlnc_math::Gf256(0x35));
    assert!(!dec.read_payload(&Payload::new(coefficients, symbol)));
    assert_eq!(dec.rank(), 2);

    while !dec.is_complete() {
        dec.read_payload(&enc.write_payload().unwrap());
    }
    // Further payloads after completion are absorbed silently.
    for _ in 0..5 {
        assert!(!dec.read_payload(&enc.write_payload().unwrap()));
    }
    assert_eq!(dec.copy_symbols(), data);
}

#[test]
fn test_state_only_moves_forward() {
    let cfg = CoderConfig::new(6, 4).unwrap();
    let mut data = vec![0u8; cfg.block_size()];
    ChaCha20Rng::seed_from_u64(3).fill_bytes(&mut data);

    let mut enc = Encoder::with_seed(cfg, 3);
    enc.set_symbols(&data).unwrap();
    let mut dec = Decoder::with_seed(cfg, 4);
    let mut loss = ChaCha20Rng::seed_from_u64(99);

    let mut last_state = dec.state();
    let mut last_rank = dec.rank();
    assert_eq!(last_state, DecoderState::Empty);

    for _ in 0..200 {
        let p = enc.write_payload().unwrap();
        if loss.next_u32() % 2 == 0 {
            continue;
        }
        dec.read_payload(&p);
        assert!(dec.rank() >= last_rank);
        assert!(dec.state() >= last_state);
        last_rank = dec.rank();
        last_state = dec.state();
        if dec.is_complete() {
            break;
        }
    }
    assert_eq!(dec.state(), DecoderState::Complete);
    assert_eq!(dec.copy_symbols(), data);
}

#[test]
fn test_partial_copy_exposes_decoded_slots() {
    let cfg = CoderConfig::new(3, 2).unwrap();
    let mut enc = Encoder::with_seed(cfg, 1);
    enc.set_symbols(&[1, 2, 3, 4, 5, 6]).unwrap();
    let mut dec = Decoder::with_seed(cfg, 2);

    let _lost = enc.write_payload().unwrap();
    dec.read_payload(&enc.write_payload().unwrap());
    assert!(dec.is_partially_complete());
    assert_eq!(dec.state(), DecoderState::Partial);
    assert_eq!(&dec.copy_symbols()[2..4], &[3, 4]);
    assert_eq!(dec.decoded_symbol(0), None);

    let mut out = vec![0u8; 6];
    dec.copy_symbols_into(&mut out).unwrap();
    assert_eq!(out, dec.copy_symbols());
}

#[test]
fn test_wire_round_trip() {
    let cfg = CoderConfig::new(5, 7).unwrap();
    let mut data = vec![0u8; cfg.block_size()];
    ChaCha20Rng::seed_from_u64(31).fill_bytes(&mut data);

    let mut enc = Encoder::with_seed(cfg, 31);
    enc.set_symbols(&data).unwrap();
    let mut dec = Decoder::with_seed(cfg, 32);

    let mut sent = 0;
    while !dec.is_complete() && sent < 100 {
        let bytes = enc.encode().unwrap();
        assert_eq!(bytes.len(), cfg.payload_size());
        if sent % 3 != 0 {
            dec.decode(&bytes).unwrap();
        }
        sent += 1;
    }
    assert!(dec.is_complete());
    assert_eq!(dec.copy_symbols(), data);
    assert!(dec.decode(&[0u8; 3]).is_err());
}

#[test]
fn test_seeded_encoders_agree() {
    let cfg = CoderConfig::new(4, 4).unwrap();
    let data: Vec<u8> = (0..16).collect();
    let mut a = Encoder::with_seed(cfg, 77);
    let mut b = Encoder::with_seed(cfg, 1);
    b.set_seed(77);
    a.set_symbols(&data).unwrap();
    b.set_symbols(&data).unwrap();
    a.set_systematic_off();
    b.set_systematic_off();
    for _ in 0..10 {
        assert_eq!(a.write_payload().unwrap(), b.write_payload().unwrap());
    }
}

#[test]
fn test_systematic_toggle_resumes() {
    let cfg = CoderConfig::new(3, 1).unwrap();
    let mut enc = Encoder::with_seed(cfg, 8);
    enc.set_symbols(&[7, 8, 9]).unwrap();

    assert_eq!(enc.write_payload().unwrap().systematic_index(), Some(0));
    enc.set_systematic_off();
    assert!(!enc.in_systematic_phase());
    let coded = enc.write_payload().unwrap();
    assert_eq!(coded.coefficients().len(), 3);
    enc.set_systematic_on();
    assert_eq!(enc.write_payload().unwrap().systematic_index(), Some(1));
    assert_eq!(enc.write_payload().unwrap().systematic_index(), Some(2));
    assert!(!enc.in_systematic_phase());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_any_independent_set_decodes(
        k in 1usize..=64,
        size in 1usize..=256,
        seed in any::<u64>(),
        keep_percent in 0u32..=100,
    ) {
        let cfg = CoderConfig::new(k, size).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut data = vec![0u8; cfg.block_size()];
        rng.fill_bytes(&mut data);

        let mut enc = Encoder::with_seed(cfg, seed ^ 0x5555);
        enc.set_symbols(&data).unwrap();

        // Some systematic payloads survive, the rest of the set is coded.
        let mut candidates = Vec::new();
        for _ in 0..k {
            let p = enc.write_payload().unwrap();
            if rng.next_u32() % 100 < keep_percent {
                candidates.push(p);
            }
        }
        for _ in 0..(k + 8) {
            candidates.push(enc.write_payload().unwrap());
        }

        let mut picked = independent_set(candidates, k);
        prop_assume!(picked.len() == k);
        shuffle(&mut picked, &mut rng);

        let mut dec = Decoder::with_seed(cfg, seed);
        for p in &picked {
            prop_assert!(!dec.is_complete());
            prop_assert!(dec.read_payload(p));
        }
        prop_assert!(dec.is_complete());
        prop_assert_eq!(dec.copy_symbols(), data);
    }

    #[test]
    fn prop_extra_payloads_are_harmless(
        k in 1usize..=16,
        size in 1usize..=32,
        seed in any::<u64>(),
    ) {
        let cfg = CoderConfig::new(k, size).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut data = vec![0u8; cfg.block_size()];
        rng.fill_bytes(&mut data);

        let mut enc = Encoder::with_seed(cfg, seed);
        enc.set_symbols(&data).unwrap();
        let mut stream: Vec<Payload> = (0..(3 * k + 16)).map(|_| enc.write_payload().unwrap()).collect();
        // Duplicates of some payloads are always dependent on their originals.
        let dupes: Vec<Payload> = stream.iter().step_by(2).cloned().collect();
        stream.extend(dupes);
        shuffle(&mut stream, &mut rng);

        let mut dec = Decoder::with_seed(cfg, seed);
        let mut innovative = 0;
        for p in &stream {
            if dec.read_payload(p) {
                innovative += 1;
            }
        }
        prop_assert_eq!(innovative, dec.rank());
        prop_assert!(dec.is_complete());
        prop_assert_eq!(dec.copy_symbols(), data);
    }
}
