//! In-memory word-combo adjacency index and shortest-bridge search.
//!
//! The membership relation forms an undirected bipartite graph: words on one
//! side, combos on the other, memberships as edges. `WordGraph` caches both
//! directions of that adjacency from a single scan of `combo_map`, so
//! connectivity queries never touch the store. The index is an explicitly
//! owned value: callers build it, pass it to the scheduler, and rebuild it
//! wholesale after any membership mutation.

use std::collections::{HashMap, HashSet, VecDeque};

use anyhow::Result;
use rusqlite::Connection;

use crate::store::BASE_WORD_DEGREE;

/// Bridge searches stop once a path would exceed this many combos; a capped
/// search is reported the same as no path at all.
pub const MAX_BRIDGE_HOPS: usize = 10;

/// Bidirectional adjacency over the word-combo bipartite graph.
#[derive(Clone, Debug, Default)]
pub struct WordGraph {
    word_combos: HashMap<String, Vec<String>>,
    combo_words: HashMap<String, Vec<String>>,
}

impl WordGraph {
    /// Build the index from every membership row in one scan.
    ///
    /// Rows are read in a fixed order so tie-breaks downstream are stable for
    /// a given build (not necessarily across rebuilds after mutations).
    pub fn build(conn: &Connection) -> Result<WordGraph> {
        let mut stmt =
            conn.prepare("SELECT combo_id, word_id FROM combo_map ORDER BY combo_id, word_id")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut graph = WordGraph::default();
        for (combo_id, word_id) in rows {
            graph
                .word_combos
                .entry(word_id.clone())
                .or_default()
                .push(combo_id.clone());
            graph.combo_words.entry(combo_id).or_default().push(word_id);
        }
        Ok(graph)
    }

    /// Re-derive the whole index from the store.
    pub fn rebuild(&mut self, conn: &Connection) -> Result<()> {
        *self = WordGraph::build(conn)?;
        Ok(())
    }

    /// Combos containing the given word; empty for an unknown word.
    pub fn combos_for(&self, word_id: &str) -> &[String] {
        self.word_combos.get(word_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Member words of the given combo; empty for an unknown combo.
    pub fn members_of(&self, combo_id: &str) -> &[String] {
        self.combo_words.get(combo_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Combo-degree of a word.
    pub fn degree(&self, word_id: &str) -> u32 {
        self.combos_for(word_id).len() as u32
    }

    /// Whether the word qualifies as a base word (degree >= 4).
    pub fn is_base_word(&self, word_id: &str) -> bool {
        self.degree(word_id) >= BASE_WORD_DEGREE
    }

    /// Number of distinct words with at least one membership.
    pub fn word_count(&self) -> usize {
        self.word_combos.len()
    }

    /// Number of distinct combos with at least one member.
    pub fn combo_count(&self) -> usize {
        self.combo_words.len()
    }

    /// Shortest sequence of combos connecting `word_a` to `word_b`.
    ///
    /// A combo containing both words is returned alone. Otherwise a
    /// breadth-first search expands from every combo containing `word_a`
    /// through member words to their other combos, so the first combo found
    /// containing `word_b` closes a bridge with the fewest combos. Paths
    /// longer than [`MAX_BRIDGE_HOPS`] are abandoned.
    pub fn find_bridge(&self, word_a: &str, word_b: &str) -> Option<Vec<String>> {
        let start = self.combos_for(word_a);
        if start.is_empty() || self.combos_for(word_b).is_empty() {
            return None;
        }

        let contains_target =
            |combo_id: &str| self.members_of(combo_id).iter().any(|w| w == word_b);

        for combo_id in start {
            if contains_target(combo_id) {
                return Some(vec![combo_id.clone()]);
            }
        }

        let mut queue: VecDeque<Vec<String>> = VecDeque::new();
        let mut visited: HashSet<&str> = HashSet::new();
        for combo_id in start {
            visited.insert(combo_id);
            queue.push_back(vec![combo_id.clone()]);
        }

        while let Some(path) = queue.pop_front() {
            if path.len() >= MAX_BRIDGE_HOPS {
                continue;
            }
            let Some(current) = path.last() else {
                continue;
            };
            for word_id in self.members_of(current) {
                for next in self.combos_for(word_id) {
                    if visited.contains(next.as_str()) {
                        continue;
                    }
                    visited.insert(next);
                    let mut extended = path.clone();
                    extended.push(next.clone());
                    if contains_target(next) {
                        return Some(extended);
                    }
                    queue.push_back(extended);
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combo::{self, Combo};
    use crate::store;
    use crate::word::{self, Pos, Word};

    fn memory_store() -> Result<Connection> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", &true)?;
        store::install_schema(&conn)?;
        Ok(conn)
    }

    fn add_word(conn: &Connection, lemma: &str) -> Result<String> {
        let w = Word::new(lemma, Pos::Noun, 0);
        word::store_word(conn, &w)?;
        Ok(w.id)
    }

    fn add_combo(conn: &mut Connection, id: &str, members: &[&str]) -> Result<()> {
        let c = Combo {
            id: id.to_string(),
            display_text: id.to_string(),
            image_path: None,
        };
        let ids: Vec<String> = members.iter().map(|m| m.to_string()).collect();
        combo::store_combo(conn, &c, &ids)?;
        Ok(())
    }

    /// A linear chain `w0 -c0- w1 -c1- w2 ...` with `n` combos.
    fn chain(conn: &mut Connection, n: usize) -> Result<Vec<String>> {
        let words: Vec<String> = (0..=n)
            .map(|i| add_word(conn, &format!("w{i}")))
            .collect::<Result<_>>()?;
        for i in 0..n {
            add_combo(conn, &format!("c{i}"), &[&words[i], &words[i + 1]])?;
        }
        Ok(words)
    }

    #[test]
    fn degree_and_base_threshold() -> Result<()> {
        let mut conn = memory_store()?;
        let apple = add_word(&conn, "apple")?;
        for i in 0..4 {
            let partner = add_word(&conn, &format!("p{i}"))?;
            add_combo(&mut conn, &format!("c{i}"), &[&apple, &partner])?;
        }

        let graph = WordGraph::build(&conn)?;
        assert_eq!(graph.degree(&apple), 4);
        assert!(graph.is_base_word(&apple));
        assert!(!graph.is_base_word("p0-n-0"));
        assert!(graph.combos_for("ghost-n-0").is_empty());
        assert_eq!(graph.degree("ghost-n-0"), 0);
        assert_eq!(graph.word_count(), 5);
        assert_eq!(graph.combo_count(), 4);
        Ok(())
    }

    #[test]
    fn shared_combo_is_a_length_one_bridge() -> Result<()> {
        let mut conn = memory_store()?;
        let words = chain(&mut conn, 3)?;
        let graph = WordGraph::build(&conn)?;

        let bridge = graph.find_bridge(&words[1], &words[2]).expect("bridge");
        assert_eq!(bridge, vec!["c1"]);
        Ok(())
    }

    #[test]
    fn bfs_finds_fewest_combos() -> Result<()> {
        let mut conn = memory_store()?;
        let words = chain(&mut conn, 3)?;
        let graph = WordGraph::build(&conn)?;

        let bridge = graph.find_bridge(&words[0], &words[3]).expect("bridge");
        assert_eq!(bridge, vec!["c0", "c1", "c2"]);

        // A direct combo shortens the bridge to one hop.
        add_combo(&mut conn, "direct", &[&words[0], &words[3]])?;
        let graph = WordGraph::build(&conn)?;
        let bridge = graph.find_bridge(&words[0], &words[3]).expect("bridge");
        assert_eq!(bridge, vec!["direct"]);
        Ok(())
    }

    #[test]
    fn disconnected_words_have_no_bridge() -> Result<()> {
        let mut conn = memory_store()?;
        let a = add_word(&conn, "a")?;
        let b = add_word(&conn, "b")?;
        let c = add_word(&conn, "c")?;
        let d = add_word(&conn, "d")?;
        add_combo(&mut conn, "ab", &[&a, &b])?;
        add_combo(&mut conn, "cd", &[&c, &d])?;

        let graph = WordGraph::build(&conn)?;
        assert!(graph.find_bridge(&a, &c).is_none());
        assert!(graph.find_bridge(&a, "ghost-n-0").is_none());
        Ok(())
    }

    #[test]
    fn bridge_search_respects_hop_cap() -> Result<()> {
        let mut conn = memory_store()?;
        let words = chain(&mut conn, 11)?;
        let graph = WordGraph::build(&conn)?;

        // Eleven combos exceed the cap; ten are still allowed.
        assert!(graph.find_bridge(&words[0], &words[11]).is_none());
        let bridge = graph.find_bridge(&words[0], &words[10]).expect("bridge");
        assert_eq!(bridge.len(), 10);
        Ok(())
    }

    #[test]
    fn rebuild_picks_up_new_memberships() -> Result<()> {
        let mut conn = memory_store()?;
        let a = add_word(&conn, "a")?;
        let b = add_word(&conn, "b")?;
        add_combo(&mut conn, "ab", &[&a, &b])?;

        let mut graph = WordGraph::build(&conn)?;
        assert_eq!(graph.degree(&a), 1);

        let c = add_word(&conn, "c")?;
        add_combo(&mut conn, "ac", &[&a, &c])?;
        assert_eq!(graph.degree(&a), 1);
        graph.rebuild(&conn)?;
        assert_eq!(graph.degree(&a), 2);
        Ok(())
    }
}
