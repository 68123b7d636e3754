// pipeline.rs
// 文本处理流水线：哈希向量化 + 分类器，对外提供与估计器一致的训练与预测接口。
use crate::error::Result;
use crate::estimator::{Estimator, IncrementalEstimator};
use crate::linear::SgdClassifier;
use crate::vectorizer::HashingVectorizer;
use serde::{Deserialize, Serialize};

/// 文本分类流水线
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextPipeline {
    pub vectorizer: HashingVectorizer,
    pub classifier: SgdClassifier,
}

impl TextPipeline {
    pub fn new(vectorizer: HashingVectorizer, classifier: SgdClassifier) -> Self {
        Self {
            vectorizer,
            classifier,
        }
    }

    /// 完整训练：向量化后交给分类器
    pub fn fit(&mut self, docs: &[String], y: &[f32]) -> Result<()> {
        let features = self.vectorizer.transform(docs)?;
        self.classifier.fit(&features, y)
    }

    /// 在一批文档上增量训练，语义与分类器的 partial_fit 一致
    pub fn partial_fit(&mut self, docs: &[String], y: &[f32], classes: &[f32]) -> Result<()> {
        let features = self.vectorizer.transform(docs)?;
        self.classifier.partial_fit(&features, y, classes)
    }

    pub fn predict(&self, docs: &[String]) -> Result<Vec<f32>> {
        let features = self.vectorizer.transform(docs)?;
        self.classifier.predict(&features)
    }

    /// 准确率评分
    pub fn score(&self, docs: &[String], y: &[f32]) -> Result<f32> {
        let features = self.vectorizer.transform(docs)?;
        self.classifier.score(&features, y)
    }
}
