/// Integration tests: records written with `Record::write` and decoded with
/// `Record::read`, using the bundled payloads from `sio_codecs`.
use std::sync::Arc;

use proptest::prelude::*;
use serde::{Deserialize, Serialize};

use sio_codecs::payloads::{Point2D, Points2D, RunHeader};
use sio_codecs::{Compressed, ZstdCompressor};
use sio_core::format::{BLOCK_MARKER_BYTES, ENVELOPE_FIXED_SIZE};
use sio_core::{align4, Envelopes, Error, Options, Record};

// ── helpers ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct Calo {
    energy: f64,
    cells: Vec<u32>,
    label: String,
}

fn sample_points(n: usize) -> Points2D {
    (0..n)
        .map(|i| Point2D::new(i as f64, 0.5 * i as f64).with_errors((0.1, 0.1), (0.2, 0.3)))
        .collect()
}

fn write_three(hdr: &mut RunHeader, calo: &mut Calo, pts: &mut Points2D) -> Vec<u8> {
    let mut rec = Record::new("evt");
    rec.connect_structural("header", hdr).unwrap();
    rec.connect_structural("calo", calo).unwrap();
    rec.connect_custom("points", pts).unwrap();
    rec.to_bytes().unwrap()
}

// ── tests ──────────────────────────────────────────────────────────────────

/// Record "evt" with one "header" block holding {7, 42, 1}.
#[test]
fn test_event_header_example() {
    let mut src = RunHeader::new(7, 42, 1);
    let buf = {
        let mut rec = Record::new("evt");
        rec.connect_structural("header", &mut src).unwrap();
        rec.to_bytes().unwrap()
    };

    // 16 fixed + "header" padded to 8 + three i64
    assert_eq!(buf.len(), 48);
    assert_eq!(&buf[..8], &[0u8, 0, 0, 48, 0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(&buf[8..16], &[0u8, 0, 0, 0, 0, 0, 0, 6]);
    assert_eq!(&buf[16..24], b"header\0\0");

    let mut dst = RunHeader::default();
    {
        let mut rec = Record::new("evt");
        rec.connect_structural("header", &mut dst).unwrap();
        rec.read_from(&buf).unwrap();
    }
    assert_eq!(dst, src);
}

#[test]
fn test_roundtrip_zero_blocks() {
    let rec = Record::new("empty");
    let buf = rec.to_bytes().unwrap();
    assert!(buf.is_empty());

    let mut rec = Record::new("empty");
    rec.read_from(&buf).unwrap();
}

#[test]
fn test_roundtrip_mixed_strategies() {
    let mut hdr = RunHeader::new(1, 2, 3);
    let mut calo = Calo {
        energy: 13.5,
        cells: vec![1, 5, 9, 200],
        label: "ecal".to_string(),
    };
    let mut pts = sample_points(10);
    let buf = write_three(&mut hdr, &mut calo, &mut pts);

    let (mut h2, mut c2, mut p2) = (RunHeader::default(), Calo::default(), Points2D::default());
    {
        let mut rec = Record::new("evt");
        // connect order differs from write order: lookup is by name
        rec.connect_custom("points", &mut p2).unwrap();
        rec.connect_structural("header", &mut h2).unwrap();
        rec.connect_structural("calo", &mut c2).unwrap();
        rec.read_from(&buf).unwrap();
    }
    assert_eq!(h2, hdr);
    assert_eq!(c2, calo);
    assert_eq!(p2, pts);
}

#[test]
fn test_write_order_is_connect_order() {
    let mut hdr = RunHeader::default();
    let mut calo = Calo::default();
    let mut pts = Points2D::default();
    let buf = write_three(&mut hdr, &mut calo, &mut pts);

    let names: Vec<String> = Envelopes::new(&buf)
        .map(|e| e.unwrap().name_lossy().into_owned())
        .collect();
    assert_eq!(names, ["header", "calo", "points"]);
}

#[test]
fn test_custom_block_version_is_written() {
    let mut pts = sample_points(2);
    let mut hdr = RunHeader::default();
    let buf = {
        let mut rec = Record::new("evt");
        rec.connect_custom("points", &mut pts).unwrap();
        rec.connect_structural("header", &mut hdr).unwrap();
        rec.to_bytes().unwrap()
    };
    let versions: Vec<u32> = Envelopes::new(&buf)
        .map(|e| e.unwrap().data.version)
        .collect();
    assert_eq!(versions, [Points2D::VERSION, 0]);
}

/// A, then an unconnected B, then C: only A is decoded. The reader drops
/// everything after an unknown block instead of trusting its length word.
#[test]
fn test_unknown_block_discards_rest_of_record() {
    let mut a = RunHeader::new(1, 1, 1);
    let mut b = RunHeader::new(2, 2, 2);
    let mut c = RunHeader::new(3, 3, 3);
    let buf = {
        let mut rec = Record::new("evt");
        rec.connect_structural("a", &mut a).unwrap();
        rec.connect_structural("b", &mut b).unwrap();
        rec.connect_structural("c", &mut c).unwrap();
        rec.to_bytes().unwrap()
    };

    let (mut ra, mut rc) = (RunHeader::default(), RunHeader::default());
    let mut cur = &buf[..];
    {
        let mut rec = Record::new("evt");
        rec.connect_structural("a", &mut ra).unwrap();
        rec.connect_structural("c", &mut rc).unwrap();
        rec.read(&mut cur).unwrap();
    }
    assert_eq!(ra, a);
    assert_eq!(rc, RunHeader::default(), "blocks after an unknown one are not decoded");
    assert!(cur.is_empty());
}

#[test]
fn test_two_blocks_resync_in_order() {
    let mut first = RunHeader::new(10, 20, 30);
    let mut second = sample_points(3);
    let buf = {
        let mut rec = Record::new("evt");
        rec.connect_structural("first", &mut first).unwrap();
        rec.connect_custom("second", &mut second).unwrap();
        rec.to_bytes().unwrap()
    };

    let (mut f, mut s) = (RunHeader::default(), Points2D::default());
    {
        let mut rec = Record::new("evt");
        rec.connect_structural("first", &mut f).unwrap();
        rec.connect_custom("second", &mut s).unwrap();
        rec.read_from(&buf).unwrap();
    }
    assert_eq!(f, first);
    assert_eq!(s, second);
}

#[test]
fn test_truncated_input_never_decodes_silently() {
    let mut src = RunHeader::new(7, 42, 1);
    let buf = {
        let mut rec = Record::new("evt");
        rec.connect_structural("header", &mut src).unwrap();
        rec.to_bytes().unwrap()
    };

    for cut in 1..buf.len() {
        let mut dst = RunHeader::default();
        let mut rec = Record::new("evt");
        rec.connect_structural("header", &mut dst).unwrap();
        let err = rec.read_from(&buf[..cut]).unwrap_err();
        match cut {
            // mid-header, mid-sub-header, mid-name
            0..=23 => assert!(
                matches!(err, Error::Truncated { .. }),
                "cut {cut}: expected truncation, got {err}"
            ),
            // mid-payload
            _ => assert!(
                matches!(err, Error::Payload { ref name, .. } if name == "header"),
                "cut {cut}: expected payload error, got {err}"
            ),
        }
    }
}

/// A cut inside a later block's header leaves no complete marker to resync
/// on, so the partial header is dropped like any other trailing bytes.
#[test]
fn test_cut_inside_later_header_drops_that_block() {
    let mut a = RunHeader::new(1, 2, 3);
    let mut b = RunHeader::new(4, 5, 6);
    let buf = {
        let mut rec = Record::new("evt");
        rec.connect_structural("a", &mut a).unwrap();
        rec.connect_structural("b", &mut b).unwrap();
        rec.to_bytes().unwrap()
    };
    // 16 fixed + "a" padded to 4 + three i64
    let first_len = 44;
    assert_eq!(&buf[first_len + 4..first_len + 8], &BLOCK_MARKER_BYTES[..]);

    for cut in first_len + 1..first_len + 8 {
        let (mut ra, mut rb) = (RunHeader::default(), RunHeader::default());
        let mut cur = &buf[..cut];
        {
            let mut rec = Record::new("evt");
            rec.connect_structural("a", &mut ra).unwrap();
            rec.connect_structural("b", &mut rb).unwrap();
            rec.read(&mut cur).unwrap();
        }
        assert_eq!(ra, a, "cut {cut}");
        assert_eq!(rb, RunHeader::default(), "cut {cut}");
        assert!(cur.is_empty());
    }

    // once the marker is complete the truncation is reported
    let mut rb = RunHeader::default();
    let mut ra = RunHeader::default();
    let mut rec = Record::new("evt");
    rec.connect_structural("a", &mut ra).unwrap();
    rec.connect_structural("b", &mut rb).unwrap();
    let err = rec.read_from(&buf[..first_len + 8]).unwrap_err();
    assert!(matches!(err, Error::Truncated { .. }), "got {err}");
}

#[test]
fn test_compressed_payload_in_record() {
    let mut src = Compressed::new(sample_points(500), Arc::new(ZstdCompressor::default()));
    let buf = {
        let mut rec = Record::new("evt");
        rec.connect_custom("points", &mut src).unwrap();
        rec.to_bytes().unwrap()
    };
    // the option word stays in memory; the block stream is unchanged
    let flagged = {
        let mut rec = Record::new("evt");
        rec.set_compress(true);
        rec.connect_custom("points", &mut src).unwrap();
        rec.to_bytes().unwrap()
    };
    assert_eq!(flagged, buf);
    let env = Envelopes::new(&buf).next().unwrap().unwrap();
    assert_eq!(env.data.version, Points2D::VERSION);
    assert!(env.payload.len() < 4 + 500 * 48, "points should compress");

    let mut dst = Compressed::new(Points2D::default(), Arc::new(ZstdCompressor::default()));
    {
        let mut rec = Record::new("evt");
        rec.connect_custom("points", &mut dst).unwrap();
        rec.read_from(&buf).unwrap();
    }
    assert_eq!(dst.inner(), src.inner());
}

#[test]
fn test_resync_realigns_on_next_marker() {
    let mut a = RunHeader::new(1, 2, 3);
    let mut b = RunHeader::new(4, 5, 6);
    let first = {
        let mut rec = Record::new("evt");
        rec.connect_structural("a", &mut a).unwrap();
        rec.to_bytes().unwrap()
    };
    let second = {
        let mut rec = Record::new("evt");
        rec.connect_structural("b", &mut b).unwrap();
        rec.to_bytes().unwrap()
    };
    let mut buf = first;
    buf.extend_from_slice(&[0u8; 12]);
    buf.extend_from_slice(&second);
    assert_eq!(
        buf.windows(4).filter(|w| *w == BLOCK_MARKER_BYTES).count(),
        2
    );

    let (mut ra, mut rb) = (RunHeader::default(), RunHeader::default());
    {
        let mut rec = Record::new("evt");
        rec.connect_structural("a", &mut ra).unwrap();
        rec.connect_structural("b", &mut rb).unwrap();
        rec.read_from(&buf).unwrap();
    }
    assert_eq!(ra, a);
    assert_eq!(rb, b);
}

// ── properties ─────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn prop_envelope_len_accounts_for_every_byte(
        name in "[a-z]{1,17}",
        payload in proptest::collection::vec(any::<u32>(), 0..32),
    ) {
        let mut value = payload.clone();
        let buf = {
            let mut rec = Record::new("p");
            rec.connect_structural(&name, &mut value).unwrap();
            rec.to_bytes().unwrap()
        };

        let envs: Vec<_> = Envelopes::new(&buf).collect::<Result<_, _>>().unwrap();
        prop_assert_eq!(envs.len(), 1);
        let env = &envs[0];
        let padded = align4(name.len() as u32) as usize;
        prop_assert_eq!(padded, name.len().div_ceil(4) * 4);
        prop_assert_eq!(env.header.len as usize, buf.len());
        prop_assert_eq!(buf.len(), ENVELOPE_FIXED_SIZE + padded + env.payload.len());
        // u64 length prefix + u32 items
        prop_assert_eq!(env.payload.len(), 8 + 4 * payload.len());
        prop_assert!(buf[ENVELOPE_FIXED_SIZE + name.len()..ENVELOPE_FIXED_SIZE + padded]
            .iter()
            .all(|&b| b == 0));
    }

    #[test]
    fn prop_compress_toggle_restores_options(bits in any::<u32>()) {
        let mut rec = Record::new("p");
        rec.set_options(Options::from_bits_retain(bits));
        rec.set_compress(true);
        prop_assert!(rec.compress());
        rec.set_compress(false);
        prop_assert_eq!(rec.options().bits(), bits & !Options::COMPRESS.bits());
        if bits & Options::COMPRESS.bits() == 0 {
            prop_assert_eq!(rec.options().bits(), bits);
        }
    }

    #[test]
    fn prop_roundtrip_run_headers(
        values in proptest::collection::vec(any::<(i64, i64, i64)>(), 0..6),
    ) {
        let mut src: Vec<RunHeader> = values
            .iter()
            .map(|&(r, e, t)| RunHeader::new(r, e, t))
            .collect();
        let names: Vec<String> = (0..src.len()).map(|i| format!("hdr{i}")).collect();

        let buf = {
            let mut rec = Record::new("evt");
            for (name, h) in names.iter().zip(src.iter_mut()) {
                rec.connect_structural(name, h).unwrap();
            }
            rec.to_bytes().unwrap()
        };

        let mut dst = vec![RunHeader::default(); src.len()];
        {
            let mut rec = Record::new("evt");
            for (name, h) in names.iter().zip(dst.iter_mut()) {
                rec.connect_structural(name, h).unwrap();
            }
            rec.read_from(&buf).unwrap();
        }
        prop_assert_eq!(dst, src);
    }
}
