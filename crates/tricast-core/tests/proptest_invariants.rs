// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use chrono::NaiveDate;
use proptest::prelude::*;
use tricast_core::{DrawRecord, DrawSequence};

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2030, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| {
        NaiveDate::from_ymd_opt(y, m, d).expect("day <= 28 is valid in every month")
    })
}

proptest! {
    #[test]
    fn digit_decomposition_round_trips(number in 0u16..=999) {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date");
        let record = DrawRecord::new(date, number).expect("valid record");
        let rebuilt = u16::from(record.hundred()) * 100
            + u16::from(record.ten()) * 10
            + u16::from(record.one());
        prop_assert_eq!(rebuilt, number);
        prop_assert!(record.hundred() <= 9);
        prop_assert!(record.ten() <= 9);
        prop_assert!(record.one() <= 9);
        prop_assert!(record.digit_sum() <= 27);
        prop_assert!(record.digit_span() <= 9);
    }

    #[test]
    fn set_string_is_always_three_digits(number in 0u16..=999) {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date");
        let record = DrawRecord::new(date, number).expect("valid record");
        let set = record.as_set_string();
        prop_assert_eq!(set.len(), 3);
        prop_assert!(set.chars().all(|c| c.is_ascii_digit()));
        let mini = record.as_mini_string();
        prop_assert_eq!(&set[1..], mini.as_str());
    }

    #[test]
    fn sequence_stays_sorted_after_arbitrary_appends(
        draws in proptest::collection::vec((arb_date(), 0u16..=999), 1..40)
    ) {
        let mut sequence = DrawSequence::new();
        for (date, number) in draws {
            let record = DrawRecord::new(date, number).expect("valid record");
            // Duplicate (date, number) pairs are legitimately rejected.
            let _ = sequence.append(record);
        }
        let records = sequence.records();
        for pair in records.windows(2) {
            prop_assert!(pair[0].date <= pair[1].date);
        }
        for (i, a) in records.iter().enumerate() {
            for b in &records[i + 1..] {
                prop_assert!(!(a.date == b.date && a.number == b.number));
            }
        }
    }
}
