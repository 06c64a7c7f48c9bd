// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event-based entity streaming over [`EntityScanner`].
//!
//! This is the tokenization-level stream: one [`ParseEvent`] per discovered
//! entity plus periodic progress markers. It knows nothing about batching
//! policy, geometry, or the store — that's `ifc-lite-processing`'s job,
//! which consumes entities at this level and re-packages them into the
//! batch/event stream consumers actually see.

use crate::parser::EntityScanner;

/// Tuning knobs for [`parse_stream`].
#[derive(Debug, Clone, Copy)]
pub struct StreamConfig {
    /// Emit a `Progress` event after this many entities have been scanned.
    pub progress_interval: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            progress_interval: 5_000,
        }
    }
}

/// One unit of the tokenization-level stream.
#[derive(Debug, Clone)]
pub enum ParseEvent<'a> {
    /// A single STEP entity header was located (not yet decoded).
    Entity {
        id: u32,
        type_name: &'a str,
        start: usize,
        end: usize,
    },
    /// Emitted every `progress_interval` entities.
    Progress { entities_scanned: usize, percent: f32 },
    /// The scanner reached the end of the `DATA` section.
    Complete { total_entities: usize },
}

/// Scan `content` and yield a [`ParseEvent`] per entity, interleaved with
/// `Progress` events per [`StreamConfig::progress_interval`].
///
/// This never stops early on a malformed entity: `EntityScanner` already
/// skips forms it cannot tokenize, so a single bad entity does not abort
/// the stream (see `Error::is_fatal` for what does).
pub fn parse_stream(content: &str, config: StreamConfig) -> impl Iterator<Item = ParseEvent<'_>> {
    ParseStream {
        scanner: EntityScanner::new(content),
        config,
        scanned: 0,
        total_len: content.len(),
        done: false,
    }
}

struct ParseStream<'a> {
    scanner: EntityScanner<'a>,
    config: StreamConfig,
    scanned: usize,
    total_len: usize,
    done: bool,
}

impl<'a> Iterator for ParseStream<'a> {
    type Item = ParseEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.scanner.next_entity() {
            Some((id, type_name, start, end)) => {
                self.scanned += 1;
                if self.config.progress_interval > 0
                    && self.scanned % self.config.progress_interval == 0
                {
                    return Some(ParseEvent::Progress {
                        entities_scanned: self.scanned,
                        percent: (end as f32 / self.total_len.max(1) as f32) * 100.0,
                    });
                }
                Some(ParseEvent::Entity {
                    id,
                    type_name,
                    start,
                    end,
                })
            }
            None => {
                self.done = true;
                Some(ParseEvent::Complete {
                    total_entities: self.scanned,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streams_entities_then_completes() {
        let content = "DATA;\n#1=IFCPROJECT('g',$,$,$,$,$,$,$,$);\n#2=IFCWALL('g2',$,$,$,$,$,$,$);\nENDSEC;";
        let config = StreamConfig {
            progress_interval: 0,
        };
        let events: Vec<_> = parse_stream(content, config).collect();
        let entity_count = events
            .iter()
            .filter(|e| matches!(e, ParseEvent::Entity { .. }))
            .count();
        assert_eq!(entity_count, 2);
        assert!(matches!(events.last(), Some(ParseEvent::Complete { total_entities: 2 })));
    }

    #[test]
    fn progress_interval_emits_markers() {
        let mut content = String::from("DATA;\n");
        for i in 1..=10u32 {
            content.push_str(&format!("#{i}=IFCWALL('g',$,$,$,$,$,$,$);\n"));
        }
        content.push_str("ENDSEC;");
        let config = StreamConfig {
            progress_interval: 3,
        };
        let events: Vec<_> = parse_stream(&content, config).collect();
        let progress_count = events
            .iter()
            .filter(|e| matches!(e, ParseEvent::Progress { .. }))
            .count();
        assert_eq!(progress_count, 3);
    }
}
