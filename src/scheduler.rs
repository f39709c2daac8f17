//! Anchor-chained card scheduling.
//!
//! The scheduler drills one anchor word at a time: it shows up to
//! [`MAX_CARDS_PER_ANCHOR`] combos containing the anchor, marks the anchor
//! learnt when the last of them is shown, then chains to the next anchor
//! through the non-anchor members of the combo it just showed. Selection is
//! a four-phase decision (anchor, budget, combo, emit) over the store and the
//! in-memory [`WordGraph`]; every random tie-break goes through a seedable
//! RNG so runs are reproducible.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::combo::{self, Combo};
use crate::graph::WordGraph;
use crate::history::{HistoryEntry, HistoryStack};
use crate::store::{self, BASE_WORD_DEGREE};
use crate::word;

/// Upper bound on cards shown per anchor; the effective budget is
/// `min(anchor degree, MAX_CARDS_PER_ANCHOR)`.
pub const MAX_CARDS_PER_ANCHOR: u32 = 3;

/// Caller-owned state for one learner session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Word currently being drilled.
    pub anchor: Option<String>,
    /// Cards already shown for the current anchor.
    pub anchor_card_count: u32,
    /// Card budget fixed when the anchor was selected.
    pub max_cards: u32,
    /// Combos already shown for the current anchor.
    pub shown_combos: HashSet<String>,
    /// Combo currently on display; the next anchor chains through it.
    pub current_combo: Option<String>,
    /// Undo stack of past transitions.
    pub history: HistoryStack,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            anchor: self.anchor.clone(),
            anchor_card_count: self.anchor_card_count,
            max_cards: self.max_cards,
            shown_combos: self.shown_combos.clone(),
            current_combo: self.current_combo.clone(),
        }
    }

    fn restore(&mut self, snapshot: SessionSnapshot) {
        self.anchor = snapshot.anchor;
        self.anchor_card_count = snapshot.anchor_card_count;
        self.max_cards = snapshot.max_cards;
        self.shown_combos = snapshot.shown_combos;
        self.current_combo = snapshot.current_combo;
    }
}

/// Session fields restored verbatim on retreat; everything except the
/// history stack itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub anchor: Option<String>,
    pub anchor_card_count: u32,
    pub max_cards: u32,
    pub shown_combos: HashSet<String>,
    pub current_combo: Option<String>,
}

/// A scheduled flashcard ready for display.
#[derive(Clone, Debug, Serialize)]
pub struct Card {
    pub combo: Combo,
    pub member_words: SmallVec<[String; 4]>,
    pub anchor: String,
    /// 1-based position of this card within the anchor's budget.
    pub card_number: u32,
    pub max_cards: u32,
}

/// Outcome of an advance: either a card or vocabulary exhaustion.
/// Exhaustion is a value, not an error.
#[derive(Clone, Debug)]
pub enum NextCard {
    Card(Card),
    Complete,
}

struct ChainCandidate {
    id: String,
    degree: u32,
    learnt: bool,
}

/// Card and anchor selection over a store connection and a graph snapshot.
pub struct Scheduler<'a> {
    conn: &'a Connection,
    graph: &'a WordGraph,
    rng: StdRng,
}

impl<'a> Scheduler<'a> {
    /// Build a scheduler; pass a seed to make tie-breaks reproducible.
    pub fn new(conn: &'a Connection, graph: &'a WordGraph, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { conn, graph, rng }
    }

    /// Move the session forward one card.
    ///
    /// Keeps the active anchor while its budget lasts, otherwise chains to a
    /// new one through the combo on display (falling back to a cold start),
    /// then picks a combo the anchor has not shown yet. The pre-transition
    /// state goes onto the history stack so [`Scheduler::retreat`] can undo
    /// this exactly, including the learnt flip recorded when the anchor's
    /// final card is dealt.
    pub fn advance(&mut self, session: &mut SessionState) -> Result<NextCard> {
        let graph = self.graph;
        let snapshot = session.snapshot();

        // Phase 1: determine the anchor.
        let keep = session
            .anchor
            .clone()
            .filter(|_| session.anchor_card_count < session.max_cards);
        let anchor = match keep {
            Some(anchor) => anchor,
            None => {
                let chained = match (session.current_combo.clone(), session.anchor.clone()) {
                    (Some(prev_combo), Some(prev_anchor)) => {
                        self.chain_anchor(&prev_combo, &prev_anchor)?
                    }
                    _ => None,
                };
                let next = match chained {
                    Some(anchor) => Some(anchor),
                    None => self.cold_start_anchor()?,
                };
                let Some(anchor) = next else {
                    return Ok(NextCard::Complete);
                };
                // Phase 2: new anchor, recompute the budget once and reset
                // the per-anchor state.
                session.anchor = Some(anchor.clone());
                session.anchor_card_count = 0;
                session.max_cards = MAX_CARDS_PER_ANCHOR.min(graph.degree(&anchor));
                session.shown_combos.clear();
                anchor
            }
        };

        // Phase 3: pick a combo for this anchor.
        let combo_id = self.select_combo(session, &anchor)?;

        // Phase 4: emit the card and record the transition.
        let combo = combo::get_combo(self.conn, &combo_id)?
            .ok_or_else(|| anyhow!("combo `{combo_id}` is indexed but missing from the store"))?;
        let member_words: SmallVec<[String; 4]> =
            graph.members_of(&combo_id).iter().cloned().collect();

        session.anchor_card_count += 1;
        session.shown_combos.insert(combo_id.clone());
        session.current_combo = Some(combo_id);

        // Reaching the budget on this card is what marks the anchor learnt;
        // the matching history entry carries the inverse. An anchor revisited
        // after it was already learnt records no flip, so a retreat cannot
        // clear a flag this advance never set.
        let mut learnt_flip = None;
        if session.anchor_card_count >= session.max_cards
            && !word::load_word(self.conn, &anchor)?.learnt
        {
            store::set_learnt(self.conn, &anchor, true)?;
            learnt_flip = Some(anchor.clone());
        }
        session.history.push(HistoryEntry {
            snapshot,
            learnt_flip,
        });

        Ok(NextCard::Card(Card {
            combo,
            member_words,
            anchor,
            card_number: session.anchor_card_count,
            max_cards: session.max_cards,
        }))
    }

    /// Undo the most recent advance.
    ///
    /// Reverses any learnt flip the advance performed, restores the session
    /// snapshot verbatim, and re-emits the card that was on display before
    /// the undone step. `Ok(None)` when the stack is empty (no-op) or when
    /// the undone advance was the first card of the session.
    pub fn retreat(&mut self, session: &mut SessionState) -> Result<Option<Card>> {
        let Some(entry) = session.history.pop() else {
            return Ok(None);
        };
        if let Some(word_id) = &entry.learnt_flip {
            store::set_learnt(self.conn, word_id, false)?;
        }
        session.restore(entry.snapshot);

        let Some(combo_id) = session.current_combo.clone() else {
            return Ok(None);
        };
        let combo = combo::load_combo(self.conn, &combo_id)?;
        let anchor = session
            .anchor
            .clone()
            .ok_or_else(|| anyhow!("session shows combo `{combo_id}` but has no anchor"))?;
        let member_words = self.graph.members_of(&combo_id).iter().cloned().collect();
        Ok(Some(Card {
            combo,
            member_words,
            anchor,
            card_number: session.anchor_card_count,
            max_cards: session.max_cards,
        }))
    }

    /// Forget all learning progress and restart from a cold session.
    pub fn reset(&mut self, session: &mut SessionState) -> Result<()> {
        store::clear_all_learnt(self.conn)?;
        *session = SessionState::new();
        Ok(())
    }

    /// Chain to the next anchor through the previous combo's other members.
    ///
    /// Candidates are filtered down a priority ladder: unlearnt base words by
    /// degree, then any base word (unlearnt preferred, then degree), then any
    /// member at all (unlearnt preferred). Ties break randomly. `None` means
    /// the combo offered no candidate and the caller should cold-start.
    fn chain_anchor(&mut self, prev_combo: &str, prev_anchor: &str) -> Result<Option<String>> {
        let graph = self.graph;
        let mut candidates = Vec::new();
        for word_id in graph.members_of(prev_combo) {
            if word_id == prev_anchor {
                continue;
            }
            let word = word::load_word(self.conn, word_id)?;
            candidates.push(ChainCandidate {
                id: word_id.clone(),
                degree: graph.degree(word_id),
                learnt: word.learnt,
            });
        }
        if candidates.is_empty() {
            return Ok(None);
        }

        let tier: Vec<&ChainCandidate> = candidates
            .iter()
            .filter(|c| !c.learnt && c.degree >= BASE_WORD_DEGREE)
            .collect();
        if let Some(choice) = self.pick_best(&tier, |c| c.degree) {
            return Ok(Some(choice));
        }

        let tier: Vec<&ChainCandidate> = candidates
            .iter()
            .filter(|c| c.degree >= BASE_WORD_DEGREE)
            .collect();
        if let Some(choice) = self.pick_best(&tier, |c| (!c.learnt, c.degree)) {
            return Ok(Some(choice));
        }

        let tier: Vec<&ChainCandidate> = candidates.iter().collect();
        Ok(self.pick_best(&tier, |c| !c.learnt))
    }

    /// Highest key wins; equal keys are settled by the session RNG.
    fn pick_best<K: Ord>(
        &mut self,
        tier: &[&ChainCandidate],
        key: impl Fn(&ChainCandidate) -> K,
    ) -> Option<String> {
        let best = tier.iter().map(|c| key(c)).max()?;
        let ties: Vec<&str> = tier
            .iter()
            .filter(|c| key(c) == best)
            .map(|c| c.id.as_str())
            .collect();
        Some(ties[self.rng.gen_range(0..ties.len())].to_string())
    }

    /// Pick the globally richest unlearnt base word, or signal exhaustion.
    ///
    /// The store returns candidates ordered by degree then id; the random
    /// choice among the top-degree group happens here so it is seedable.
    fn cold_start_anchor(&mut self) -> Result<Option<String>> {
        let candidates = store::list_base_word_candidates(self.conn, true)?;
        let Some(top) = candidates.first() else {
            return Ok(None);
        };
        let top_degree = top.degree;
        let ties: Vec<&store::Candidate> = candidates
            .iter()
            .take_while(|c| c.degree == top_degree)
            .collect();
        Ok(Some(ties[self.rng.gen_range(0..ties.len())].id.clone()))
    }

    /// Pick a combo for the anchor, avoiding repeats while any combo is
    /// still unshown and steering the anchor's final card toward a partner
    /// that chains richly.
    fn select_combo(&mut self, session: &SessionState, anchor: &str) -> Result<String> {
        let graph = self.graph;
        let all = graph.combos_for(anchor);
        if all.is_empty() {
            bail!("anchor `{anchor}` has no combos; the adjacency index and store disagree");
        }
        let unshown: Vec<&String> = all
            .iter()
            .filter(|c| !session.shown_combos.contains(c.as_str()))
            .collect();

        let final_card = session.anchor_card_count + 1 >= session.max_cards;
        if final_card && !unshown.is_empty() {
            if let Some(choice) = self.pick_rich_partner(&unshown, anchor) {
                return Ok(choice);
            }
        }
        if !unshown.is_empty() {
            return Ok(unshown[self.rng.gen_range(0..unshown.len())].clone());
        }
        // Budget outruns the anchor's distinct combos; allow a repeat.
        Ok(all[self.rng.gen_range(0..all.len())].clone())
    }

    /// Final-card bias: the combo whose best non-anchor member has the
    /// highest degree, considering only partners that can chain onward
    /// (degree >= 2). `None` when no candidate has such a partner.
    fn pick_rich_partner(&mut self, candidates: &[&String], anchor: &str) -> Option<String> {
        let graph = self.graph;
        let mut best: Vec<&String> = Vec::new();
        let mut best_degree = 0;
        for &combo_id in candidates {
            let partner_degree = graph
                .members_of(combo_id)
                .iter()
                .filter(|w| w.as_str() != anchor)
                .map(|w| graph.degree(w))
                .max()
                .unwrap_or(0);
            if partner_degree < 2 {
                continue;
            }
            if partner_degree > best_degree {
                best_degree = partner_degree;
                best.clear();
                best.push(combo_id);
            } else if partner_degree == best_degree {
                best.push(combo_id);
            }
        }
        if best.is_empty() {
            return None;
        }
        Some(best[self.rng.gen_range(0..best.len())].clone())
    }
}

/// Write a session, history included, as pretty JSON.
pub fn save_session(path: &Path, session: &SessionState) -> Result<()> {
    let json = serde_json::to_string_pretty(session)?;
    fs::write(path, json)
        .with_context(|| format!("failed to write session to {}", path.display()))?;
    Ok(())
}

/// Read a session saved by [`save_session`].
pub fn load_session(path: &Path) -> Result<SessionState> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read session from {}", path.display()))?;
    Ok(serde_json::from_str(&json)?)
}
