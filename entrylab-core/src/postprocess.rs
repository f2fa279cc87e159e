//! Entry postprocessing: cluster collapse, then per-side cooldown.
//!
//! Both passes count distance in list positions, not bars. Raw entries come
//! out of a strategy at most one per bar and in bar order, so a position gap of
//! `k` always means a bar gap of at least `k`.

use crate::domain::{EntryEvent, Side};

fn slot(side: Side) -> usize {
    match side {
        Side::Long => 0,
        Side::Short => 1,
    }
}

/// Collapse clusters, then enforce cooldown. Linear in `raw.len()`.
///
/// 1. A candidate within `cluster_window_bars` positions of the last retained
///    same-side entry replaces it only with strictly higher confidence (the
///    replacement moves to the end, keeping time order); otherwise it is
///    dropped. Candidates outside the window are appended.
/// 2. An entry survives cooldown when it sits at least `cooldown_bars`
///    positions after the previous surviving same-side entry.
pub fn postprocess(
    raw: &[EntryEvent],
    cluster_window_bars: usize,
    cooldown_bars: usize,
) -> Vec<EntryEvent> {
    let clustered = collapse_clusters(raw, cluster_window_bars);
    apply_cooldown(clustered, cooldown_bars)
}

fn collapse_clusters(raw: &[EntryEvent], window: usize) -> Vec<EntryEvent> {
    // (raw position, event); None marks a replaced entry
    let mut kept: Vec<Option<(usize, &EntryEvent)>> = Vec::with_capacity(raw.len());
    let mut last: [Option<usize>; 2] = [None, None];

    for (pos, event) in raw.iter().enumerate() {
        let s = slot(event.side);
        let anchor = last[s].and_then(|idx| kept[idx].map(|(p, e)| (idx, p, e)));

        if let Some((idx, anchor_pos, anchor_event)) = anchor {
            if pos - anchor_pos <= window {
                if event.confidence > anchor_event.confidence {
                    kept[idx] = None;
                    kept.push(Some((pos, event)));
                    last[s] = Some(kept.len() - 1);
                }
                continue;
            }
        }

        kept.push(Some((pos, event)));
        last[s] = Some(kept.len() - 1);
    }

    kept.into_iter().flatten().map(|(_, e)| e.clone()).collect()
}

fn apply_cooldown(entries: Vec<EntryEvent>, cooldown: usize) -> Vec<EntryEvent> {
    let mut last: [Option<usize>; 2] = [None, None];
    let mut out = Vec::with_capacity(entries.len());

    for (pos, event) in entries.into_iter().enumerate() {
        let s = slot(event.side);
        let clear = match last[s] {
            Some(prev) => pos - prev >= cooldown,
            None => true,
        };
        if clear {
            last[s] = Some(pos);
            out.push(event);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RegimeTag;
    use chrono::NaiveDate;

    fn entry(bar: usize, side: Side, confidence: f64) -> EntryEvent {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        EntryEvent {
            ts: base + chrono::Duration::hours(bar as i64),
            bar_index: bar,
            side,
            confidence,
            price: 100.0,
            reasons: vec![],
            regime: RegimeTag::Range,
        }
    }

    fn bars(entries: &[EntryEvent]) -> Vec<usize> {
        entries.iter().map(|e| e.bar_index).collect()
    }

    #[test]
    fn empty_input() {
        assert!(postprocess(&[], 3, 5).is_empty());
    }

    #[test]
    fn stronger_entry_replaces_cluster_head() {
        let raw = vec![
            entry(10, Side::Long, 0.6),
            entry(11, Side::Long, 0.8),
            entry(12, Side::Long, 0.7),
        ];
        let out = postprocess(&raw, 3, 0);
        assert_eq!(bars(&out), vec![11]);
        assert_eq!(out[0].confidence, 0.8);
    }

    #[test]
    fn equal_confidence_keeps_earlier() {
        let raw = vec![entry(10, Side::Long, 0.6), entry(11, Side::Long, 0.6)];
        assert_eq!(bars(&postprocess(&raw, 3, 0)), vec![10]);
    }

    #[test]
    fn replacement_moves_after_other_side() {
        let raw = vec![
            entry(10, Side::Long, 0.6),
            entry(11, Side::Short, 0.7),
            entry(12, Side::Long, 0.9),
        ];
        let out = postprocess(&raw, 3, 0);
        assert_eq!(bars(&out), vec![11, 12]);
    }

    #[test]
    fn outside_window_appends() {
        let raw = vec![
            entry(10, Side::Long, 0.6),
            entry(11, Side::Short, 0.6),
            entry(12, Side::Short, 0.6),
            entry(13, Side::Long, 0.6),
        ];
        let out = postprocess(&raw, 2, 0);
        assert_eq!(bars(&out), vec![10, 11, 13]);
    }

    #[test]
    fn zero_window_disables_clustering() {
        let raw: Vec<EntryEvent> = (0..5).map(|i| entry(i, Side::Long, 0.6)).collect();
        assert_eq!(postprocess(&raw, 0, 0).len(), 5);
    }

    #[test]
    fn cooldown_counts_same_side_only() {
        let raw = vec![
            entry(0, Side::Long, 0.6),
            entry(1, Side::Short, 0.6),
            entry(2, Side::Long, 0.6),
            entry(3, Side::Short, 0.6),
            entry(4, Side::Long, 0.6),
        ];
        let out = postprocess(&raw, 0, 4);
        assert_eq!(bars(&out), vec![0, 1, 4]);
    }

    #[test]
    fn output_is_time_ordered_and_deterministic() {
        let raw: Vec<EntryEvent> = (0..40)
            .map(|i| {
                let side = if i % 3 == 0 { Side::Short } else { Side::Long };
                entry(i * 2, side, 0.5 + (i % 7) as f64 * 0.05)
            })
            .collect();
        let a = postprocess(&raw, 3, 5);
        let b = postprocess(&raw, 3, 5);
        assert_eq!(a, b);
        assert!(a.windows(2).all(|w| w[0].bar_index < w[1].bar_index));
    }
}
