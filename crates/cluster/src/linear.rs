// linear.rs
// 基于随机梯度下降的二分类逻辑回归分类器，支持增量训练。
use crate::error::{Error, Result};
use crate::estimator::{Estimator, IncrementalEstimator};
use crate::types::DenseMatrix;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// SGD 逻辑回归分类器
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SgdClassifier {
    /// 学习率
    pub learning_rate: f32,
    /// L2 正则化系数
    pub alpha: f32,
    /// 完整训练的迭代轮数
    pub n_epochs: usize,
    /// 随机种子，控制每轮的样本顺序
    pub seed: u64,
    /// 权重向量，训练后有值
    weights: Vec<f32>,
    /// 偏置
    bias: f32,
    /// 类别列表（升序，两类）
    classes: Vec<f32>,
    /// 是否已初始化
    fitted: bool,
}

impl SgdClassifier {
    pub fn new() -> Self {
        Self {
            learning_rate: 0.1,
            alpha: 0.0001,
            n_epochs: 10,
            seed: 42,
            weights: Vec::new(),
            bias: 0.0,
            classes: Vec::new(),
            fitted: false,
        }
    }

    pub fn set_learning_rate(&mut self, learning_rate: f32) {
        self.learning_rate = learning_rate;
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
    }

    pub fn set_n_epochs(&mut self, n_epochs: usize) {
        self.n_epochs = n_epochs;
    }

    /// 训练后的类别列表
    pub fn classes(&self) -> &[f32] {
        &self.classes
    }

    fn sigmoid(z: f32) -> f32 {
        1.0 / (1.0 + (-z).exp())
    }

    fn check_input(&self, x: &DenseMatrix, y: &[f32]) -> Result<()> {
        if x.n_rows != y.len() {
            return Err(Error::DataError(format!(
                "样本数 {} 与标签数 {} 不匹配",
                x.n_rows,
                y.len()
            )));
        }
        Ok(())
    }

    /// 初始化权重与类别列表
    fn initialize(&mut self, n_features: usize, classes: &[f32]) -> Result<()> {
        let mut sorted = classes.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        sorted.dedup();
        if sorted.len() != 2 {
            return Err(Error::TrainError(format!(
                "仅支持二分类，收到 {} 个类别",
                sorted.len()
            )));
        }
        self.weights = vec![0.0; n_features];
        self.bias = 0.0;
        self.classes = sorted;
        self.fitted = true;
        Ok(())
    }

    /// 在给定样本序列上执行一轮 SGD 更新
    fn update_pass(&mut self, x: &DenseMatrix, y: &[f32], order: &[usize]) -> Result<()> {
        for &i in order {
            let row = x.row(i);
            let label = y[i];
            if label != self.classes[0] && label != self.classes[1] {
                return Err(Error::TrainError(format!(
                    "标签 {} 不在类别列表 {:?} 中",
                    label, self.classes
                )));
            }
            let target = if label == self.classes[1] { 1.0 } else { 0.0 };

            let z: f32 = row
                .iter()
                .zip(self.weights.iter())
                .map(|(xi, wi)| xi * wi)
                .sum::<f32>()
                + self.bias;
            let grad = Self::sigmoid(z) - target;

            for (wi, xi) in self.weights.iter_mut().zip(row.iter()) {
                *wi -= self.learning_rate * (grad * xi + self.alpha * *wi);
            }
            self.bias -= self.learning_rate * grad;
        }
        Ok(())
    }
}

impl Default for SgdClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Estimator for SgdClassifier {
    /// 重置状态并完整训练，每轮打乱样本顺序
    fn fit(&mut self, x: &DenseMatrix, y: &[f32]) -> Result<()> {
        self.check_input(x, y)?;
        self.fitted = false;

        let mut classes = y.to_vec();
        classes.sort_by(|a, b| a.partial_cmp(b).unwrap());
        classes.dedup();
        self.initialize(x.n_cols, &classes)?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut order: Vec<usize> = (0..x.n_rows).collect();
        for _ in 0..self.n_epochs {
            order.shuffle(&mut rng);
            self.update_pass(x, y, &order)?;
        }
        Ok(())
    }

    fn predict(&self, x: &DenseMatrix) -> Result<Vec<f32>> {
        if !self.fitted {
            return Err(Error::PredictError("模型尚未训练".to_string()));
        }
        if x.n_cols != self.weights.len() {
            return Err(Error::PredictError(format!(
                "特征数 {} 与训练时的 {} 不匹配",
                x.n_cols,
                self.weights.len()
            )));
        }
        let mut predictions = Vec::with_capacity(x.n_rows);
        for row in x.rows() {
            let z: f32 = row
                .iter()
                .zip(self.weights.iter())
                .map(|(xi, wi)| xi * wi)
                .sum::<f32>()
                + self.bias;
            let class = if Self::sigmoid(z) > 0.5 {
                self.classes[1]
            } else {
                self.classes[0]
            };
            predictions.push(class);
        }
        Ok(predictions)
    }

    /// 准确率评分
    fn score(&self, x: &DenseMatrix, y: &[f32]) -> Result<f32> {
        self.check_input(x, y)?;
        let predictions = self.predict(x)?;
        let correct = predictions
            .iter()
            .zip(y.iter())
            .filter(|(p, t)| (*p - *t).abs() < f32::EPSILON)
            .count();
        Ok(correct as f32 / y.len() as f32)
    }
}

impl IncrementalEstimator for SgdClassifier {
    /// 在单个数据块上执行一轮更新，按存储顺序遍历样本。
    /// 首次调用时按 classes 初始化权重与类别列表。
    fn partial_fit(&mut self, x: &DenseMatrix, y: &[f32], classes: &[f32]) -> Result<()> {
        self.check_input(x, y)?;
        if !self.fitted {
            self.initialize(x.n_cols, classes)?;
        }
        let order: Vec<usize> = (0..x.n_rows).collect();
        self.update_pass(x, y, &order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::make_classification;

    #[test]
    fn test_fit_learns_separable_problem() {
        let (x, y) = make_classification(200, 5, 3, 4.0, 3).unwrap();
        let mut model = SgdClassifier::new();
        model.set_n_epochs(20);
        model.fit(&x, &y).unwrap();
        let accuracy = model.score(&x, &y).unwrap();
        assert!(accuracy > 0.9, "训练集准确率过低: {}", accuracy);
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let model = SgdClassifier::new();
        let x = DenseMatrix::zeros(3, 2);
        assert!(model.predict(&x).is_err());
    }

    #[test]
    fn test_partial_fit_initializes_classes() {
        let (x, y) = make_classification(100, 4, 2, 4.0, 5).unwrap();
        let mut model = SgdClassifier::new();
        model.partial_fit(&x, &y, &[0.0, 1.0]).unwrap();
        assert_eq!(model.classes(), &[0.0, 1.0]);
        // 第二次调用不重置状态
        model.partial_fit(&x, &y, &[0.0, 1.0]).unwrap();
        let accuracy = model.score(&x, &y).unwrap();
        assert!(accuracy > 0.7);
    }

    #[test]
    fn test_rejects_unknown_label() {
        let x = DenseMatrix::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let mut model = SgdClassifier::new();
        assert!(model.partial_fit(&x, &[0.0, 7.0], &[0.0, 1.0]).is_err());
    }

    #[test]
    fn test_rejects_multiclass() {
        let x = DenseMatrix::zeros(3, 2);
        let mut model = SgdClassifier::new();
        assert!(model
            .partial_fit(&x, &[0.0, 1.0, 2.0], &[0.0, 1.0, 2.0])
            .is_err());
    }
}
