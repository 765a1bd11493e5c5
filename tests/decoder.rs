//! Host-level tests for the decoder family and the result filter.
//!
//! Sections are built by hand here; the end-to-end path from edges to
//! sections is covered in `track_scenarios.rs`.

use rf433_kit::decoder::{self, Convention, DecoderKind, Filter, Signal};
use rf433_kit::track::{RawCode, Section, SectionStatus, Timings};

/// Pack a most-significant-first bit list into a rail record.
fn pack(bits: &[bool]) -> u16 {
    bits.iter().fold(0, |rec, &b| (rec << 1) | u16::from(b))
}

/// A two-band section with the usual shared 620/1240 timings.
fn tribit_section(low: &[bool], high: &[bool], sts: SectionStatus) -> Section {
    let sep = if sts == SectionStatus::Continued {
        0
    } else {
        11000
    };
    Section {
        low_rec: pack(low),
        low_bits: low.len() as u8,
        low_bands: 2,
        high_rec: pack(high),
        high_bits: high.len() as u8,
        high_bands: 2,
        first_low: 620,
        first_high: 1240,
        last_low: 620,
        ts: Timings {
            low_short: 620,
            low_long: 1240,
            high_short: 0,
            high_long: 0,
            sep,
        },
        sts,
    }
}

fn rawcode(initseq: u16, sections: &[Section]) -> RawCode {
    let mut rawcode = RawCode {
        initseq,
        max_code_d: initseq - initseq / 4,
        sections: heapless::Vec::new(),
    };
    for section in sections {
        rawcode.sections.push(*section).unwrap();
    }
    rawcode
}

const S: bool = false;
const L: bool = true;

#[test]
fn tribit_pairs_decode_with_the_leading_step_recovered() {
    // first_low 620 / first_high 1240 recover as one extra (short, long)
    // step in front of the recorded (short, long), (long, short).
    let rc = rawcode(9000, &[tribit_section(&[S, L], &[L, S], SectionStatus::ShortSep)]);
    let chain = decoder::decode(&rc, Filter::ALL, Convention::Conv0);
    assert_eq!(chain.len(), 1);
    let dec = &chain[0];
    assert_eq!(dec.kind(), DecoderKind::TriBit);
    assert_eq!(dec.nb_errors(), 0);
    assert_eq!(dec.nb_bits(), 3);
    assert_eq!(format!("{}", dec.data()), "1"); // bits 0, 0, 1

    let timings = dec.timings();
    assert_eq!(timings.initseq, 9000);
    assert_eq!(timings.sep, 11000);
    assert_eq!(timings.first_low, 0); // consumed by the recovered step
    assert_eq!(timings.first_high, 0);
}

#[test]
fn convention_swaps_tribit_polarity() {
    let rc = rawcode(9000, &[tribit_section(&[S, L], &[L, S], SectionStatus::ShortSep)]);
    let chain = decoder::decode(&rc, Filter::ALL, Convention::Conv1);
    assert_eq!(format!("{}", chain[0].data()), "6"); // bits 1, 1, 0
}

#[test]
fn tribit_wins_over_later_candidates_when_error_free() {
    // All (short, long) steps satisfy the inverted coding too; the plain
    // tri-bit decoder is tried first and keeps the section.
    let rc = rawcode(
        9000,
        &[tribit_section(&[S; 8], &[L; 8], SectionStatus::ShortSep)],
    );
    let chain = decoder::decode(&rc, Filter::ALL, Convention::Conv0);
    assert_eq!(chain[0].kind(), DecoderKind::TriBit);
    assert_eq!(chain[0].nb_errors(), 0);
}

#[test]
fn manchester_section_decodes() {
    // 0xb4 Manchester after the mandatory leading low/high: six recorded
    // lows (L S L L S S) and five highs (L S L S S), with the opening
    // 400/800 pair recovered as the leading step.
    let section = Section {
        low_rec: pack(&[L, S, L, L, S, S]),
        low_bits: 6,
        low_bands: 2,
        high_rec: pack(&[L, S, L, S, S]),
        high_bits: 5,
        high_bands: 2,
        first_low: 400,
        first_high: 800,
        last_low: 400,
        ts: Timings {
            low_short: 400,
            low_long: 800,
            high_short: 0,
            high_long: 0,
            sep: 6000,
        },
        sts: SectionStatus::ShortSep,
    };
    let chain = decoder::decode(&rawcode(5000, &[section]), Filter::ALL, Convention::Conv0);
    assert_eq!(chain.len(), 1);
    let dec = &chain[0];
    assert_eq!(dec.kind(), DecoderKind::Manchester);
    assert_eq!(dec.nb_errors(), 0);
    assert_eq!(dec.nb_bits(), 8);
    assert_eq!(format!("{}", dec.data()), "b4");
    assert_eq!(dec.timings().initseq, 5000);
    assert_eq!(dec.timings().sep, 6000);
}

#[test]
fn single_band_rails_make_a_sync_preamble() {
    let section = Section {
        low_rec: 0,
        low_bits: 10,
        low_bands: 1,
        high_rec: 0,
        high_bits: 10,
        high_bands: 1,
        first_low: 400,
        first_high: 400,
        last_low: 400,
        ts: Timings {
            low_short: 400,
            low_long: 400,
            high_short: 400,
            high_long: 400,
            sep: 6000,
        },
        sts: SectionStatus::SepSep,
    };
    let chain = decoder::decode(&rawcode(8000, &[section]), Filter::ALL, Convention::Conv0);
    assert_eq!(chain.len(), 1);
    let dec = &chain[0];
    assert_eq!(dec.kind(), DecoderKind::RawSync);
    assert_eq!(dec.nb_errors(), 0);
    // Ten recorded pairs plus the recovered leading one.
    assert_eq!(dec.nb_bits(), 11);
    assert!(dec.data().is_empty());
}

#[test]
fn rail_disagreement_yields_raw_inconsistent() {
    // Six high bits against eight low bits: the rails disagree by two.
    let section = tribit_section(&[S, L, S, L, S, L, S, L], &[L, S, L, S, L, S], SectionStatus::ShortSep);
    let chain = decoder::decode(&rawcode(9000, &[section]), Filter::ALL, Convention::Conv0);
    assert_eq!(chain[0].kind(), DecoderKind::RawInconsistent);
    assert_eq!(chain[0].nb_bits(), 0);
    assert_eq!(chain[0].nb_errors(), 0);
}

#[test]
fn lone_single_band_rail_yields_raw_inconsistent() {
    let mut section = tribit_section(&[S, L, S, L, S, L, S, L], &[L, S, L, S, L, S, L, S], SectionStatus::ShortSep);
    section.high_bands = 1;
    let chain = decoder::decode(&rawcode(9000, &[section]), Filter::ALL, Convention::Conv0);
    assert_eq!(chain[0].kind(), DecoderKind::RawInconsistent);
}

#[test]
fn unclassifiable_coding_falls_back_to_raw_unknown() {
    // (long, long) and (short, short) steps violate all three codings;
    // the fallback records the raw shape, two bits per step. The odd
    // trailing low is the one that preceded the separator.
    let mut section = tribit_section(&[L, L, S, S, S], &[L, L, S, S], SectionStatus::ShortSep);
    section.first_low = 0; // nothing to recover
    section.first_high = 0;
    let chain = decoder::decode(&rawcode(9000, &[section]), Filter::ALL, Convention::Conv0);
    assert_eq!(chain.len(), 1);
    let dec = &chain[0];
    assert_eq!(dec.kind(), DecoderKind::RawUnknown);
    assert_eq!(dec.nb_errors(), 0);
    assert_eq!(dec.nb_bits(), 8);
    assert_eq!(format!("{}", dec.data()), "f0");
    assert_eq!(dec.raw_tail(), Some(Signal::Short));
}

#[test]
fn continued_sections_share_one_decoder_and_accumulate_errors() {
    let clean = tribit_section(
        &[S, S, S, S, S, S, S, S, S, S, S, S, S, S, S, L],
        &[L, L, L, L, L, L, L, L, L, L, L, L, L, L, L, S],
        SectionStatus::Continued,
    );
    let mut broken = tribit_section(&[S; 8], &[S; 8], SectionStatus::ShortSep);
    broken.first_low = 0;
    broken.first_high = 0;
    let chain = decoder::decode(&rawcode(9000, &[clean, broken]), Filter::ALL, Convention::Conv0);
    // One decoder for the run, carrying the continuation's errors.
    assert_eq!(chain.len(), 1);
    assert_eq!(chain[0].kind(), DecoderKind::TriBit);
    assert_eq!(chain[0].nb_bits(), 17);
    assert_eq!(chain[0].nb_errors(), 8);

    let chain = decoder::decode(
        &rawcode(9000, &[clean, broken]),
        Filter::NO_ERROR,
        Convention::Conv0,
    );
    assert!(chain.is_empty());
}

#[test]
fn initseq_is_reported_by_the_first_decoder_only() {
    let section = tribit_section(&[S, L, S, L], &[L, S, L, S], SectionStatus::ShortSep);
    let chain = decoder::decode(&rawcode(9000, &[section, section]), Filter::ALL, Convention::Conv0);
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[0].timings().initseq, 9000);
    assert_eq!(chain[1].timings().initseq, 0);
}

#[test]
fn dedup_folds_identical_neighbours_and_counts_repeats() {
    let section = tribit_section(&[S, L, S, L], &[L, S, L, S], SectionStatus::ShortSep);
    let chain = decoder::decode(
        &rawcode(9000, &[section, section]),
        Filter::DEDUP,
        Convention::Conv0,
    );
    assert_eq!(chain.len(), 1);
    assert_eq!(chain[0].repeats(), 1);

    // Without the filter both survive, repeats untouched.
    let chain = decoder::decode(&rawcode(9000, &[section, section]), Filter::ALL, Convention::Conv0);
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[0].repeats(), 0);
}

#[test]
fn decoded_filter_drops_raw_results() {
    let mut garbage = tribit_section(&[L, L, S, S], &[L, L, S, S], SectionStatus::ShortSep);
    garbage.first_low = 0;
    garbage.first_high = 0;
    let chain = decoder::decode(&rawcode(9000, &[garbage]), Filter::DECODED, Convention::Conv0);
    assert!(chain.is_empty());

    let tribit = tribit_section(&[S, L, S, L], &[L, S, L, S], SectionStatus::ShortSep);
    let chain = decoder::decode(&rawcode(9000, &[tribit]), Filter::DECODED, Convention::Conv0);
    assert_eq!(chain.len(), 1);
}

#[test]
fn coding_mask_keeps_only_the_named_codings() {
    let tribit = tribit_section(&[S, L, S, L], &[L, S, L, S], SectionStatus::ShortSep);
    let rc = rawcode(9000, &[tribit]);

    let chain = decoder::decode(&rc, Filter::TRI, Convention::Conv0);
    assert_eq!(chain.len(), 1);

    let chain = decoder::decode(&rc, Filter::TRN, Convention::Conv0);
    assert!(chain.is_empty());

    let chain = decoder::decode(&rc, Filter::TRN | Filter::MAN, Convention::Conv0);
    assert!(chain.is_empty());

    let chain = decoder::decode(&rc, Filter::TRN | Filter::TRI, Convention::Conv0);
    assert_eq!(chain.len(), 1);
}

#[test]
fn filters_combine() {
    let filter = Filter::DECODED | Filter::NO_ERROR | Filter::DEDUP;
    assert!(filter.contains(Filter::DECODED));
    assert!(filter.contains(Filter::NO_ERROR));
    assert!(filter.contains(Filter::DEDUP));
    assert!(!filter.contains(Filter::TRI));
}
