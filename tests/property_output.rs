// tests/property_output.rs

use std::collections::VecDeque;
use std::io::{self, Read};

use proptest::prelude::*;

use execbar::exec::buffer::{MIN_HEADROOM, OutputBuffer};
use execbar::exec::parser::take_continuous_chunks;

/// Reader handing out scripted pieces; `None` is a `WouldBlock`.
struct Pieces(VecDeque<Option<Vec<u8>>>);

impl Read for Pieces {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.0.pop_front() {
            None => Ok(0),
            Some(None) => Err(io::ErrorKind::WouldBlock.into()),
            Some(Some(mut piece)) => {
                let n = piece.len().min(buf.len());
                if n < piece.len() {
                    let rest = piece.split_off(n);
                    self.0.push_front(Some(rest));
                }
                buf[..n].copy_from_slice(&piece);
                Ok(n)
            }
        }
    }
}

fn pieces_strategy() -> impl Strategy<Value = Vec<Option<Vec<u8>>>> {
    proptest::collection::vec(
        prop_oneof![
            4 => proptest::collection::vec(any::<u8>(), 1..3000).prop_map(Some),
            1 => Just(None),
        ],
        0..12,
    )
}

proptest! {
    #[test]
    fn draining_keeps_every_byte_in_order(pieces in pieces_strategy()) {
        let expected: Vec<u8> = pieces.iter().flatten().flatten().copied().collect();
        let mut reader = Pieces(pieces.into_iter().collect());
        let mut buf = OutputBuffer::new();

        loop {
            let drained = buf.drain(&mut reader);
            if drained.eof {
                break;
            }
        }

        prop_assert_eq!(buf.as_bytes(), expected.as_slice());
        prop_assert!(buf.capacity() >= buf.len());
        prop_assert!(buf.capacity() >= MIN_HEADROOM);
    }

    #[test]
    fn chunking_does_not_depend_on_how_output_arrives(
        lines in proptest::collection::vec("[a-z0-9 ]{0,8}", 0..20),
        tail in "[a-z]{0,5}",
        per_chunk in 1usize..4,
        cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..6),
    ) {
        let mut stream = String::new();
        for line in &lines {
            stream.push_str(line);
            stream.push('\n');
        }
        stream.push_str(&tail);
        let bytes = stream.as_bytes();

        let mut offsets: Vec<usize> = cuts.iter().map(|c| c.index(bytes.len() + 1)).collect();
        offsets.push(0);
        offsets.push(bytes.len());
        offsets.sort_unstable();
        offsets.dedup();

        let mut buf = OutputBuffer::new();
        let mut last = None;
        for window in offsets.windows(2) {
            buf.extend_from_slice(&bytes[window[0]..window[1]]);
            if let Some(content) = take_continuous_chunks(&mut buf, per_chunk, false) {
                last = Some(content.text);
            }
        }

        let complete = lines.len() / per_chunk;
        let expected_last = (complete > 0)
            .then(|| lines[(complete - 1) * per_chunk..complete * per_chunk].join("\n"));
        prop_assert_eq!(last, expected_last);

        let mut expected_rest = String::new();
        for line in &lines[complete * per_chunk..] {
            expected_rest.push_str(line);
            expected_rest.push('\n');
        }
        expected_rest.push_str(&tail);
        prop_assert_eq!(buf.as_bytes(), expected_rest.as_bytes());
    }
}
