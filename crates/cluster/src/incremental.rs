// incremental.rs
// 增量训练适配器，将支持 partial_fit 的估计器依次喂入分块数据。
use crate::chunked::ChunkedMatrix;
use crate::error::{Error, Result};
use crate::estimator::{Estimator, IncrementalEstimator};
use crate::types::DenseMatrix;

/// 增量训练适配器。
/// fit 按块顺序调用内部估计器的 partial_fit；
/// 若提供验证集，每处理完一个块就记录一次验证评分（学习曲线）。
pub struct Incremental<E: IncrementalEstimator> {
    model: E,
    /// 完整类别列表，首个块训练前传给 partial_fit
    classes: Vec<f32>,
    /// 每个块训练后的验证评分
    score_history: Vec<f32>,
    fitted: bool,
}

impl<E: IncrementalEstimator> Incremental<E> {
    pub fn new(model: E, classes: Vec<f32>) -> Self {
        Self {
            model,
            classes,
            score_history: Vec::new(),
            fitted: false,
        }
    }

    /// 在分块数据上增量训练。
    /// y 与分块矩阵按行对齐；validation 为可选的验证集 (特征, 标签)。
    pub fn fit(
        &mut self,
        x: &ChunkedMatrix,
        y: &[f32],
        validation: Option<(&DenseMatrix, &[f32])>,
    ) -> Result<()> {
        if y.len() != x.n_rows {
            return Err(Error::DataError(format!(
                "标签数 {} 与样本数 {} 不匹配",
                y.len(),
                x.n_rows
            )));
        }

        self.score_history.clear();
        for chunk_id in 0..x.n_chunks() {
            let (start, end) = x.chunk_range(chunk_id);
            self.model
                .partial_fit(x.chunk(chunk_id), &y[start..end], &self.classes)?;
            if let Some((x_val, y_val)) = validation {
                let score = self.model.score(x_val, y_val)?;
                self.score_history.push(score);
            }
        }
        self.fitted = true;
        println!("增量训练完成: 共处理 {} 个数据块", x.n_chunks());
        Ok(())
    }

    /// 每个块训练后的验证评分序列
    pub fn score_history(&self) -> &[f32] {
        &self.score_history
    }

    /// 内部估计器的引用
    pub fn inner(&self) -> &E {
        &self.model
    }

    /// 取出内部估计器
    pub fn into_inner(self) -> E {
        self.model
    }

    pub fn predict(&self, x: &DenseMatrix) -> Result<Vec<f32>> {
        if !self.fitted {
            return Err(Error::PredictError("模型尚未训练".to_string()));
        }
        self.model.predict(x)
    }

    pub fn score(&self, x: &DenseMatrix, y: &[f32]) -> Result<f32> {
        if !self.fitted {
            return Err(Error::PredictError("模型尚未训练".to_string()));
        }
        self.model.score(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::make_classification;
    use crate::linear::SgdClassifier;

    #[test]
    fn test_fit_records_learning_curve() {
        let (x, y) = make_classification(400, 5, 3, 4.0, 9).unwrap();
        let (x_val, y_val) = make_classification(100, 5, 3, 4.0, 10).unwrap();

        let chunked = ChunkedMatrix::from_dense(x, 100).unwrap();
        let mut classifier = SgdClassifier::new();
        classifier.set_learning_rate(0.5);
        let mut incremental = Incremental::new(classifier, vec![0.0, 1.0]);
        incremental
            .fit(&chunked, &y, Some((&x_val, &y_val)))
            .unwrap();

        // 每个块一条评分记录
        assert_eq!(incremental.score_history().len(), 4);
        let final_score = *incremental.score_history().last().unwrap();
        assert!(final_score > 0.8, "最终验证准确率过低: {}", final_score);
    }

    #[test]
    fn test_fit_rejects_misaligned_targets() {
        let (x, _) = make_classification(100, 4, 2, 2.0, 1).unwrap();
        let chunked = ChunkedMatrix::from_dense(x, 30).unwrap();
        let mut incremental = Incremental::new(SgdClassifier::new(), vec![0.0, 1.0]);
        let short_y = vec![0.0; 50];
        assert!(incremental.fit(&chunked, &short_y, None).is_err());
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let incremental = Incremental::new(SgdClassifier::new(), vec![0.0, 1.0]);
        assert!(incremental.predict(&DenseMatrix::zeros(2, 2)).is_err());
    }
}
