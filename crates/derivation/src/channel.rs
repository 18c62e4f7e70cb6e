//! Channel reassembly: collects the frames of one channel until the terminal
//! frame makes it ready, then streams its batches out of the decompressed
//! payload.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::*;

use crate::batch::{read_batches, Batch};
use crate::fetch::FrameWithMetadata;
use crate::frame::{ChannelId, Frame};

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("frame for channel {0} added to channel {1}")]
    WrongChannel(ChannelId, ChannelId),

    #[error("duplicate frame {0}")]
    DuplicateFrame(u16),

    #[error("frame {0} past the terminal frame {1}")]
    FrameAfterClose(u16, u16),

    #[error("second terminal frame {0}")]
    SecondCloseFrame(u16),
}

/// In-progress reassembly of one channel.
#[derive(Debug)]
pub struct Channel {
    id: ChannelId,
    /// L1 block the first frame of this channel was seen in.
    inclusion_block: u64,
    frames: BTreeMap<u16, Frame>,
    last_frame_number: Option<u16>,
}

impl Channel {
    pub fn new(id: ChannelId, inclusion_block: u64) -> Self {
        Self {
            id,
            inclusion_block,
            frames: BTreeMap::new(),
            last_frame_number: None,
        }
    }

    pub fn inclusion_block(&self) -> u64 {
        self.inclusion_block
    }

    pub fn add_frame(&mut self, frame: Frame) -> Result<(), ChannelError> {
        if frame.id != self.id {
            return Err(ChannelError::WrongChannel(frame.id, self.id));
        }
        if self.frames.contains_key(&frame.number) {
            return Err(ChannelError::DuplicateFrame(frame.number));
        }
        if let Some(last) = self.last_frame_number {
            if frame.is_last {
                return Err(ChannelError::SecondCloseFrame(frame.number));
            }
            if frame.number > last {
                return Err(ChannelError::FrameAfterClose(frame.number, last));
            }
        }

        if frame.is_last {
            self.last_frame_number = Some(frame.number);
            // Frames past the terminal frame carry no channel data.
            self.frames.retain(|num, _| *num <= frame.number);
        }
        self.frames.insert(frame.number, frame);
        Ok(())
    }

    /// Ready once the terminal frame is present along with every frame
    /// before it.
    pub fn is_ready(&self) -> bool {
        match self.last_frame_number {
            Some(last) => self.frames.len() == last as usize + 1,
            None => false,
        }
    }

    /// Concatenated frame payloads in frame order.
    pub fn assemble(&self) -> Vec<u8> {
        let mut data = Vec::new();
        for frame in self.frames.values() {
            data.extend_from_slice(&frame.data);
        }
        data
    }
}

/// Reassembly outcome for one channel.  Invalid frames or batches are
/// recorded, not fatal; the caller decides what a bad channel means.
#[derive(Debug)]
pub struct ChannelWithMetadata {
    pub id: ChannelId,
    pub is_ready: bool,
    pub invalid_frames: bool,
    pub invalid_batches: bool,
    pub batches: Vec<Batch>,
}

/// Feeds the frames of one channel through reassembly and batch extraction.
pub fn process_frames(id: ChannelId, frames: Vec<FrameWithMetadata>) -> ChannelWithMetadata {
    let inclusion_block = frames.first().map(|f| f.inclusion_block).unwrap_or(0);
    let mut channel = Channel::new(id, inclusion_block);
    let mut invalid_frames = false;

    for frame in frames {
        if channel.is_ready() {
            warn!(%id, "channel is ready despite having more frames");
            invalid_frames = true;
            break;
        }
        if let Err(err) = channel.add_frame(frame.frame) {
            warn!(%id, %err, "error adding frame to channel");
            invalid_frames = true;
        }
    }

    let mut batches = Vec::new();
    let mut invalid_batches = false;
    if channel.is_ready() {
        match read_batches(&channel.assemble()) {
            Ok(read) => batches = read,
            Err(err) => {
                warn!(%id, %err, "error reading batches from channel");
                invalid_batches = true;
            }
        }
    } else {
        warn!(%id, "channel is not ready");
    }

    ChannelWithMetadata {
        id,
        is_ready: channel.is_ready(),
        invalid_frames,
        invalid_batches,
        batches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(number: u16, is_last: bool) -> Frame {
        Frame {
            id: ChannelId([3; 16]),
            number,
            data: vec![number as u8],
            is_last,
        }
    }

    #[test]
    fn test_out_of_order_frames_assemble_in_order() {
        let mut channel = Channel::new(ChannelId([3; 16]), 10);
        channel.add_frame(frame(1, false)).unwrap();
        assert!(!channel.is_ready());
        channel.add_frame(frame(2, true)).unwrap();
        assert!(!channel.is_ready());
        channel.add_frame(frame(0, false)).unwrap();
        assert!(channel.is_ready());

        assert_eq!(channel.assemble(), vec![0, 1, 2]);
    }

    #[test]
    fn test_duplicate_frame_rejected() {
        let mut channel = Channel::new(ChannelId([3; 16]), 10);
        channel.add_frame(frame(0, false)).unwrap();
        assert!(matches!(
            channel.add_frame(frame(0, false)),
            Err(ChannelError::DuplicateFrame(0))
        ));
    }

    #[test]
    fn test_frame_past_terminal_rejected() {
        let mut channel = Channel::new(ChannelId([3; 16]), 10);
        channel.add_frame(frame(1, true)).unwrap();
        assert!(matches!(
            channel.add_frame(frame(2, false)),
            Err(ChannelError::FrameAfterClose(2, 1))
        ));
        assert!(matches!(
            channel.add_frame(frame(0, true)),
            Err(ChannelError::SecondCloseFrame(0))
        ));
    }

    #[test]
    fn test_wrong_channel_rejected() {
        let mut channel = Channel::new(ChannelId([4; 16]), 10);
        assert!(matches!(
            channel.add_frame(frame(0, false)),
            Err(ChannelError::WrongChannel(..))
        ));
    }

    #[test]
    fn test_process_frames_flags_invalid() {
        let metadata = |f: Frame| FrameWithMetadata {
            inclusion_block: 10,
            timestamp: 100,
            frame: f,
        };

        // Duplicate frame 0; channel still completes via the terminal frame.
        let out = process_frames(
            ChannelId([3; 16]),
            vec![
                metadata(frame(0, false)),
                metadata(frame(0, false)),
                metadata(frame(1, true)),
            ],
        );
        assert!(out.invalid_frames);
        assert!(out.is_ready);
        // Channel data is not a valid zlib stream, so batches are invalid.
        assert!(out.invalid_batches);
        assert!(out.batches.is_empty());
    }
}
