use std::sync::{Arc, Mutex};

use rlnc_coder::{CoderConfig, Decoder, Encoder, Zone};

type Log = Arc<Mutex<Vec<(Zone, String)>>>;

fn recorder() -> (Log, impl FnMut(Zone, &str) + Send + 'static) {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    (log, move |zone: Zone, msg: &str| sink.lock().unwrap().push((zone, msg.to_string())))
}

fn run(enc: &mut Encoder, dec: &mut Decoder) {
    while !dec.is_complete() {
        let p = enc.write_payload().unwrap();
        dec.read_payload(&p);
    }
}

#[test]
fn test_decoder_reports_zones() {
    let cfg = CoderConfig::new(3, 2).unwrap();
    let mut enc = Encoder::with_seed(cfg, 1);
    enc.set_symbols(&[1, 2, 3, 4, 5, 6]).unwrap();
    let mut dec = Decoder::with_seed(cfg, 2);

    let (log, callback) = recorder();
    dec.trace(callback);
    assert!(dec.has_trace());
    run(&mut enc, &mut dec);

    let log = log.lock().unwrap();
    let count = |zone: Zone| log.iter().filter(|(z, _)| *z == zone).count();
    assert_eq!(count(Zone::InputSymbolCoefficients), 3);
    assert_eq!(count(Zone::PivotFound), 3);
    assert_eq!(count(Zone::DecoderState), 3);
    assert_eq!(count(Zone::DecoderComplete), 1);

    let (_, first) = &log[0];
    assert_eq!(first, "01 00 00");
    let (_, last_state) = log.iter().rev().find(|(z, _)| *z == Zone::DecoderState).unwrap();
    assert_eq!(last_state.lines().count(), 3);
    assert!(last_state.lines().all(|l| l.contains(" U: ")));
}

#[test]
fn test_filtered_trace_only_sees_selected_zones() {
    let cfg = CoderConfig::new(4, 4).unwrap();
    let mut enc = Encoder::with_seed(cfg, 3);
    enc.set_symbols(&[9u8; 16]).unwrap();
    enc.set_systematic_off();
    let mut dec = Decoder::with_seed(cfg, 4);

    let (log, callback) = recorder();
    dec.filtered_trace(|zone| matches!(zone, Zone::DecoderState | Zone::InputSymbolCoefficients), callback);
    run(&mut enc, &mut dec);

    let log = log.lock().unwrap();
    assert!(!log.is_empty());
    assert!(log.iter().all(|(z, _)| matches!(z, Zone::DecoderState | Zone::InputSymbolCoefficients)));
}

#[test]
fn test_tracing_does_not_change_results() {
    let cfg = CoderConfig::new(6, 3).unwrap();
    let data: Vec<u8> = (0..18).map(|i| i * 7).collect();

    let mut plain_enc = Encoder::with_seed(cfg, 5);
    let mut traced_enc = Encoder::with_seed(cfg, 5);
    plain_enc.set_symbols(&data).unwrap();
    traced_enc.set_symbols(&data).unwrap();
    let (_log, callback) = recorder();
    traced_enc.trace(callback);

    let mut plain = Decoder::with_seed(cfg, 6);
    let mut traced = Decoder::with_seed(cfg, 6);
    let (_dlog, dcallback) = recorder();
    traced.trace(dcallback);

    for i in 0..12 {
        let a = plain_enc.write_payload().unwrap();
        let b = traced_enc.write_payload().unwrap();
        assert_eq!(a, b);
        if i % 2 == 1 {
            assert_eq!(plain.read_payload(&a), traced.read_payload(&b));
            assert_eq!(plain.copy_symbols(), traced.copy_symbols());
        }
    }
}

#[test]
fn test_encoder_phase_and_clear() {
    let cfg = CoderConfig::new(2, 1).unwrap();
    let mut enc = Encoder::with_seed(cfg, 7);
    enc.set_symbols(&[1, 2]).unwrap();

    let (log, callback) = recorder();
    enc.trace(callback);
    for _ in 0..4 {
        enc.write_payload().unwrap();
    }
    {
        let log = log.lock().unwrap();
        assert_eq!(log.iter().filter(|(z, _)| *z == Zone::EncoderPhase).count(), 1);
        assert_eq!(log.iter().filter(|(z, _)| *z == Zone::OutputSymbolCoefficients).count(), 4);
    }

    enc.clear_trace();
    assert!(!enc.has_trace());
    enc.write_payload().unwrap();
    assert_eq!(log.lock().unwrap().len(), 5);
}
