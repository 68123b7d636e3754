// estimator.rs
// 模型估计器的统一接口，约定 fit / predict / score 与增量训练语义。
use crate::error::Result;
use crate::types::DenseMatrix;

/// 估计器统一接口。
/// fit 会重置模型状态并在给定数据上完整训练；
/// predict 返回每个样本的预测标签；
/// score 返回模型在给定数据上的评分（分类器为准确率）。
pub trait Estimator {
    fn fit(&mut self, x: &DenseMatrix, y: &[f32]) -> Result<()>;
    fn predict(&self, x: &DenseMatrix) -> Result<Vec<f32>>;
    fn score(&self, x: &DenseMatrix, y: &[f32]) -> Result<f32>;
}

/// 支持增量训练的估计器。
/// partial_fit 在给定数据块上执行一轮更新而不重置已有状态；
/// 首次调用时必须通过 classes 提供完整的类别列表。
pub trait IncrementalEstimator: Estimator {
    fn partial_fit(&mut self, x: &DenseMatrix, y: &[f32], classes: &[f32]) -> Result<()>;
}
