use serde_json::Value;

use super::protocol::{FRAME_DELIMITER, MAX_FRAME_SIZE, ProtocolError, WireObject};

pub fn encode_frame(message: &WireObject) -> Result<Vec<u8>, ProtocolError> {
    let mut bytes = serde_json::to_vec(message)?;
    bytes.push(FRAME_DELIMITER);
    Ok(bytes)
}

pub fn decode_frame(frame: &[u8]) -> Result<WireObject, ProtocolError> {
    match serde_json::from_slice::<Value>(frame)? {
        Value::Object(object) => Ok(object),
        _ => Err(ProtocolError::NotAnObject),
    }
}

/// Reassembles newline-delimited frames from arbitrarily chunked bytes.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    dropped_frames: u64,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` and returns every complete frame that decoded cleanly,
    /// in arrival order. Corrupt frames are dropped and counted.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<WireObject> {
        self.buffer.extend_from_slice(chunk);

        let mut decoded = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..]
            .iter()
            .position(|&b| b == FRAME_DELIMITER)
        {
            let end = start + offset;
            let frame = &self.buffer[start..end];
            if !frame.is_empty() {
                match decode_frame(frame) {
                    Ok(message) => decoded.push(message),
                    Err(e) => {
                        self.dropped_frames += 1;
                        log::debug!("Dropping corrupt frame ({} bytes): {}", frame.len(), e);
                    }
                }
            }
            start = end + 1;
        }
        self.buffer.drain(..start);

        if self.buffer.len() > MAX_FRAME_SIZE {
            self.dropped_frames += 1;
            log::debug!(
                "Discarding {} bytes without a frame delimiter",
                self.buffer.len()
            );
            self.buffer.clear();
        }

        decoded
    }

    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use serde_json::json;

    use super::*;

    fn sample_messages() -> Vec<WireObject> {
        let values = vec![
            json!({"x": 100.5, "y": 200.0, "angle": 45.0, "health": 100}),
            json!({"scores_sync": [{"name": "Zoé", "wins": 3, "losses": 0, "games": 3}]}),
            json!({"rematch": true}),
            json!({
                "x": 1.0, "y": 2.0, "turret_angle": 3.0, "health": 50,
                "shells_data": (0..40).map(|i| json!({
                    "id": i, "x": i as f32 * 1.5, "y": 7.25, "vx": -8.0, "vy": 0.5, "bounces": i % 4
                })).collect::<Vec<_>>()
            }),
            json!({"text": "line\nbreak inside a string"}),
        ];
        values
            .into_iter()
            .map(|v| match v {
                Value::Object(o) => o,
                _ => unreachable!(),
            })
            .collect()
    }

    fn stream_of(messages: &[WireObject]) -> Vec<u8> {
        messages
            .iter()
            .flat_map(|m| encode_frame(m).unwrap())
            .collect()
    }

    #[test]
    fn encoded_frame_has_single_trailing_delimiter() {
        for message in sample_messages() {
            let frame = encode_frame(&message).unwrap();
            let delimiters = frame.iter().filter(|&&b| b == FRAME_DELIMITER).count();
            assert_eq!(delimiters, 1);
            assert_eq!(frame.last(), Some(&FRAME_DELIMITER));
        }
    }

    #[test]
    fn chunking_does_not_change_result() {
        let messages = sample_messages();
        let bytes = stream_of(&messages);
        assert!(bytes.len() > 1024);

        let mut whole = FrameDecoder::new();
        let single = whole.push(&bytes);

        let mut bytewise = FrameDecoder::new();
        let mut one_at_a_time = Vec::new();
        for byte in &bytes {
            one_at_a_time.extend(bytewise.push(std::slice::from_ref(byte)));
        }

        let mut rng = StdRng::seed_from_u64(0x7a4e);
        let mut split = FrameDecoder::new();
        let mut random_splits = Vec::new();
        let mut rest = &bytes[..];
        while !rest.is_empty() {
            let take = rng.gen_range(1..=rest.len().min(300));
            random_splits.extend(split.push(&rest[..take]));
            rest = &rest[take..];
        }

        assert_eq!(single, messages);
        assert_eq!(one_at_a_time, messages);
        assert_eq!(random_splits, messages);
        assert_eq!(whole.pending_bytes(), 0);
        assert_eq!(bytewise.pending_bytes(), 0);
        assert_eq!(split.pending_bytes(), 0);
    }

    #[test]
    fn corrupt_frame_between_valid_frames() {
        let messages = sample_messages();
        let mut bytes = encode_frame(&messages[0]).unwrap();
        bytes.extend_from_slice(b"{\"x\": 1, \"y\": \xff\xfe garbage\n");
        bytes.extend_from_slice(b"[1, 2, 3]\n");
        bytes.extend(encode_frame(&messages[2]).unwrap());

        let mut decoder = FrameDecoder::new();
        let decoded = decoder.push(&bytes);

        assert_eq!(decoded, vec![messages[0].clone(), messages[2].clone()]);
        assert_eq!(decoder.dropped_frames(), 2);
    }

    #[test]
    fn empty_frames_are_skipped() {
        let mut decoder = FrameDecoder::new();
        let decoded = decoder.push(b"\n\n{\"rematch\":true}\n\n");
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoder.dropped_frames(), 0);
    }

    #[test]
    fn partial_frame_waits_for_delimiter() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"{\"rematch\":").is_empty());
        assert_eq!(decoder.pending_bytes(), 11);
        let decoded = decoder.push(b"true}\n{\"re");
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoder.pending_bytes(), 4);
    }

    #[test]
    fn oversized_garbage_is_discarded() {
        let mut decoder = FrameDecoder::new();
        let junk = vec![b'a'; MAX_FRAME_SIZE + 1];
        assert!(decoder.push(&junk).is_empty());
        assert_eq!(decoder.pending_bytes(), 0);

        let decoded = decoder.push(b"{\"rematch\":true}\n");
        assert_eq!(decoded.len(), 1);
    }
}
