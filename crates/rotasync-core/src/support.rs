use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::events::{DomainEvent, SupportFallbackUsed};

/// How non-approved secondaries are handled when picking support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupportPolicy {
    /// Keep approved candidates; add one override pick only if none matched.
    WholeBatch,
    /// Swap each non-approved candidate for its own override pick.
    PerCandidate,
}

impl SupportPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "whole-batch" | "whole_batch" | "batch" => Some(Self::WholeBatch),
            "per-candidate" | "per_candidate" | "candidate" => Some(Self::PerCandidate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WholeBatch => "whole-batch",
            Self::PerCandidate => "per-candidate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportRoster {
    pub approved: Vec<String>,
    pub overrides: Vec<String>,
}

impl SupportRoster {
    pub fn new(approved: Vec<String>, overrides: Vec<String>) -> Self {
        Self {
            approved,
            overrides,
        }
    }

    pub fn is_approved(&self, username: &str) -> bool {
        self.approved.iter().any(|a| a == username)
    }

    pub fn select<R: Rng>(
        &self,
        policy: SupportPolicy,
        candidates: &[String],
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<(Vec<String>, Vec<DomainEvent>), DomainError> {
        let mut selected = Vec::with_capacity(candidates.len());
        let mut events = vec![];

        match policy {
            SupportPolicy::WholeBatch => {
                selected.extend(candidates.iter().filter(|c| self.is_approved(c)).cloned());
                if selected.is_empty() {
                    let picked = self.pick_override(rng)?;
                    events.push(fallback_event(None, &picked, now));
                    selected.push(picked);
                }
            }
            SupportPolicy::PerCandidate => {
                for candidate in candidates {
                    if self.is_approved(candidate) {
                        selected.push(candidate.clone());
                    } else {
                        let picked = self.pick_override(rng)?;
                        events.push(fallback_event(Some(candidate), &picked, now));
                        selected.push(picked);
                    }
                }
            }
        }

        Ok((selected, events))
    }

    fn pick_override<R: Rng>(&self, rng: &mut R) -> Result<String, DomainError> {
        if self.overrides.is_empty() {
            return Err(DomainError::EmptyOverrideList);
        }
        let index = rng.random_range(0..self.overrides.len());
        Ok(self.overrides[index].clone())
    }
}

fn fallback_event(replaced: Option<&String>, picked: &str, now: DateTime<Utc>) -> DomainEvent {
    DomainEvent::SupportFallbackUsed(SupportFallbackUsed {
        replaced: replaced.cloned(),
        picked: picked.to_string(),
        occurred_at: now,
    })
}
