// vectorizer.rs
// 哈希向量化器，将文本映射为固定宽度的特征矩阵。
// 无状态变换，不需要预先扫描词表，因此天然适合按块处理文本流。
use crate::error::{Error, Result};
use crate::types::DenseMatrix;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// 哈希向量化器
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashingVectorizer {
    /// 特征维数
    pub n_features: usize,
    /// 是否先转为小写
    pub lowercase: bool,
    /// 是否对每行做 L2 归一化
    pub l2_normalize: bool,
}

impl HashingVectorizer {
    pub fn new(n_features: usize) -> Self {
        Self {
            n_features,
            lowercase: true,
            l2_normalize: true,
        }
    }

    fn hash_token(token: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        hasher.finish()
    }

    /// 将一组文档变换为特征矩阵
    pub fn transform(&self, docs: &[String]) -> Result<DenseMatrix> {
        if self.n_features == 0 {
            return Err(Error::ConfigError("特征维数必须大于0".to_string()));
        }
        let mut matrix = DenseMatrix::zeros(docs.len(), self.n_features);
        for (i, doc) in docs.iter().enumerate() {
            let text = if self.lowercase {
                doc.to_lowercase()
            } else {
                doc.clone()
            };
            let row = &mut matrix.data[i * self.n_features..(i + 1) * self.n_features];
            for token in text
                .split(|c: char| !c.is_alphanumeric())
                .filter(|t| !t.is_empty())
            {
                let hash = Self::hash_token(token);
                let index = (hash % self.n_features as u64) as usize;
                // 用哈希最高位决定符号，缓和碰撞带来的偏差
                let sign = if hash & (1 << 63) != 0 { -1.0 } else { 1.0 };
                row[index] += sign;
            }
            if self.l2_normalize {
                let norm: f32 = row.iter().map(|v| v * v).sum::<f32>().sqrt();
                if norm > 0.0 {
                    for value in row.iter_mut() {
                        *value /= norm;
                    }
                }
            }
        }
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_deterministic() {
        let vectorizer = HashingVectorizer::new(64);
        let docs = vec!["the quick brown fox".to_string()];
        let a = vectorizer.transform(&docs).unwrap();
        let b = vectorizer.transform(&docs).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.shape(), (1, 64));
    }

    #[test]
    fn test_transform_l2_normalized() {
        let vectorizer = HashingVectorizer::new(128);
        let docs = vec!["one two three four five".to_string()];
        let matrix = vectorizer.transform(&docs).unwrap();
        let norm: f32 = matrix.row(0).iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_lowercase_merges_tokens() {
        let vectorizer = HashingVectorizer::new(256);
        let a = vectorizer.transform(&["Baseball".to_string()]).unwrap();
        let b = vectorizer.transform(&["baseball".to_string()]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_document_is_zero_row() {
        let vectorizer = HashingVectorizer::new(32);
        let matrix = vectorizer.transform(&["".to_string()]).unwrap();
        assert!(matrix.row(0).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_rejects_zero_features() {
        let vectorizer = HashingVectorizer::new(0);
        assert!(vectorizer.transform(&["text".to_string()]).is_err());
    }
}
