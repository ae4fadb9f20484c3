//! Property tests for the reply frame parser

use proptest::prelude::*;
use zaberkit_communication::{ReplyFlag, ReplyFrame};

prop_compose! {
    fn arb_frame()(
        address in "[0-9]{2}",
        accepted in any::<bool>(),
        warning in "[A-Z-]{2}",
        response in "[ -~]{0,40}",
    ) -> ReplyFrame {
        let address = address.as_bytes();
        let warning = warning.as_bytes();
        ReplyFrame {
            address: [address[0], address[1]],
            flag: if accepted { ReplyFlag::Accepted } else { ReplyFlag::Rejected },
            warning: [warning[0], warning[1]],
            response: response.into_bytes(),
        }
    }
}

proptest! {
    #[test]
    fn well_formed_frames_round_trip(frame in arb_frame()) {
        let parsed = ReplyFrame::parse(&frame.to_line()).unwrap();
        prop_assert_eq!(parsed, frame);
    }

    #[test]
    fn corrupting_any_fixed_delimiter_fails_parsing(
        frame in arb_frame(),
        offset_pick in 0usize..5,
        garbage in prop::num::u8::ANY.prop_filter("must not be the delimiter", |&b| b != b' '),
    ) {
        let offsets = [3usize, 5, 8, 13, 16];
        let mut line = frame.to_line();
        line[offsets[offset_pick]] = garbage;
        prop_assert!(ReplyFrame::parse(&line).is_err());
    }

    #[test]
    fn wrong_start_byte_fails_parsing(
        frame in arb_frame(),
        start in prop::num::u8::ANY.prop_filter("must not be the marker", |&b| b != b'@'),
    ) {
        let mut line = frame.to_line();
        line[0] = start;
        prop_assert!(ReplyFrame::parse(&line).is_err());
    }

    #[test]
    fn parser_never_panics_on_arbitrary_bytes(data in prop::collection::vec(any::<u8>(), 0..64)) {
        let _ = ReplyFrame::parse(&data);
    }
}
