use std::collections::HashMap;

use crate::application::interfaces::RankedChunk;
use crate::domain::Chunk;

/// Smoothing constant for Reciprocal Rank Fusion (§4.4). Distinct from the
/// donor crate's own `rrf_fuse` (`k = 60`, equal weights) — this pipeline's
/// fusion weights the two legs unevenly in the vector leg's favor.
pub const RRF_K: f32 = 20.0;
pub const VECTOR_WEIGHT: f32 = 0.6;
pub const FTS_WEIGHT: f32 = 0.4;

/// Fuses a vector-search leg and an FTS leg into one ranked list:
/// `score(d) = vectorWeight/(k+rank_vec(d)) + ftsWeight/(k+rank_fts(d))`, with
/// a document absent from one leg contributing zero for that term. Returns
/// up to `limit` `(chunk, fused_score)` pairs sorted by descending score;
/// boosting and page-local normalization happen downstream in the ranker.
pub fn rrf_fuse(vector: Vec<RankedChunk>, fts: Vec<RankedChunk>, limit: usize) -> Vec<(Chunk, f32)> {
    let mut scores: HashMap<String, (Chunk, f32)> = HashMap::new();

    for (rank, hit) in vector.into_iter().enumerate() {
        let rrf = VECTOR_WEIGHT / (RRF_K + (rank + 1) as f32);
        let id = hit.chunk.id().to_string();
        scores
            .entry(id)
            .and_modify(|(_, s)| *s += rrf)
            .or_insert((hit.chunk, rrf));
    }
    for (rank, hit) in fts.into_iter().enumerate() {
        let rrf = FTS_WEIGHT / (RRF_K + (rank + 1) as f32);
        let id = hit.chunk.id().to_string();
        scores
            .entry(id)
            .and_modify(|(_, s)| *s += rrf)
            .or_insert((hit.chunk, rrf));
    }

    let mut fused: Vec<(Chunk, f32)> = scores.into_values().collect();
    fused.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    fused.truncate(limit);
    fused
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str) -> Chunk {
        Chunk::reconstitute(
            id.to_string(),
            "store-1".to_string(),
            "src/lib.rs".to_string(),
            crate::domain::FileTypeTag::Source,
            "fn x() {}".to_string(),
            vec![0.0],
            "hash".to_string(),
            0,
            1,
            0,
            None,
            None,
            None,
        )
    }

    #[test]
    fn document_in_both_legs_sums_contributions() {
        let vector = vec![RankedChunk { chunk: chunk("a"), score: 0.9 }];
        let fts = vec![RankedChunk { chunk: chunk("a"), score: 5.0 }];
        let fused = rrf_fuse(vector, fts, 10);
        assert_eq!(fused.len(), 1);
        let expected = VECTOR_WEIGHT / (RRF_K + 1.0) + FTS_WEIGHT / (RRF_K + 1.0);
        assert!((fused[0].1 - expected).abs() < 1e-6);
    }

    #[test]
    fn document_absent_from_one_leg_contributes_zero_for_it() {
        let vector = vec![RankedChunk { chunk: chunk("a"), score: 0.9 }];
        let fts = vec![RankedChunk { chunk: chunk("b"), score: 5.0 }];
        let fused = rrf_fuse(vector, fts, 10);
        assert_eq!(fused.len(), 2);
        let a_score = fused.iter().find(|(c, _)| c.id() == "a").unwrap().1;
        assert!((a_score - VECTOR_WEIGHT / (RRF_K + 1.0)).abs() < 1e-6);
    }

    #[test]
    fn respects_limit() {
        let vector = (0..5)
            .map(|i| RankedChunk { chunk: chunk(&format!("c{i}")), score: 1.0 })
            .collect();
        let fused = rrf_fuse(vector, vec![], 2);
        assert_eq!(fused.len(), 2);
    }
}
