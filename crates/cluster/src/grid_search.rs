// grid_search.rs
// 网格搜索交叉验证：把每个 (候选参数, 折) 组合作为一个任务分发到集群。
use crate::client::ClusterClient;
use crate::error::{Error, Result};
use crate::estimator::Estimator;
use crate::types::DenseMatrix;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 一组具名参数，键为参数名
pub type ParamSet = BTreeMap<String, f64>;

/// 读取参数值，缺失时返回默认值
pub fn param_or(params: &ParamSet, name: &str, default: f64) -> f64 {
    params.get(name).copied().unwrap_or(default)
}

/// 参数网格，各参数轴的笛卡尔积构成候选集
#[derive(Debug, Clone, Default)]
pub struct ParamGrid {
    axes: Vec<(String, Vec<f64>)>,
}

impl ParamGrid {
    pub fn new() -> Self {
        Self { axes: Vec::new() }
    }

    /// 追加一个参数轴
    pub fn add(mut self, name: &str, values: Vec<f64>) -> Self {
        self.axes.push((name.to_string(), values));
        self
    }

    /// 展开笛卡尔积，生成全部候选参数组合
    pub fn candidates(&self) -> Vec<ParamSet> {
        let mut candidates = vec![ParamSet::new()];
        for (name, values) in &self.axes {
            let mut expanded = Vec::with_capacity(candidates.len() * values.len());
            for base in &candidates {
                for value in values {
                    let mut params = base.clone();
                    params.insert(name.clone(), *value);
                    expanded.push(params);
                }
            }
            candidates = expanded;
        }
        candidates
    }
}

/// 生成 k 折交叉验证的 (训练下标, 测试下标) 列表。
/// 各折测试集互不相交且覆盖全部样本；前 n % k 折比其余折多一个样本。
pub fn kfold_indices(
    n_samples: usize,
    k: usize,
    shuffle: bool,
    seed: u64,
) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
    if k < 2 {
        return Err(Error::ConfigError(format!("折数 {} 必须不小于2", k)));
    }
    if k > n_samples {
        return Err(Error::ConfigError(format!(
            "折数 {} 超过样本数 {}",
            k, n_samples
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    if shuffle {
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);
    }

    let base_size = n_samples / k;
    let remainder = n_samples % k;
    let mut folds = Vec::with_capacity(k);
    let mut cursor = 0;
    for fold_id in 0..k {
        let fold_size = base_size + usize::from(fold_id < remainder);
        let test: Vec<usize> = indices[cursor..cursor + fold_size].to_vec();
        let train: Vec<usize> = indices[..cursor]
            .iter()
            .chain(indices[cursor + fold_size..].iter())
            .copied()
            .collect();
        folds.push((train, test));
        cursor += fold_size;
    }
    Ok(folds)
}

/// 单个候选参数的交叉验证结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResult {
    pub params: ParamSet,
    /// 各折评分
    pub fold_scores: Vec<f32>,
    /// 各折评分均值
    pub mean_score: f32,
    /// 各折评分标准差
    pub std_score: f32,
}

/// 网格搜索交叉验证器。
/// 估计器由工厂闭包按候选参数构造；评分最高的候选在全部数据上重新训练。
/// 均值并列时取网格顺序中靠前的候选。
pub struct GridSearchCV<E, F>
where
    E: Estimator,
    F: Fn(&ParamSet) -> E + Sync,
{
    factory: F,
    grid: ParamGrid,
    /// 交叉验证折数
    pub cv: usize,
    /// 分折前是否打乱样本
    pub shuffle: bool,
    /// 随机种子
    pub seed: u64,
    results: Vec<CandidateResult>,
    best_index: Option<usize>,
    best_estimator: Option<E>,
}

impl<E, F> GridSearchCV<E, F>
where
    E: Estimator,
    F: Fn(&ParamSet) -> E + Sync,
{
    pub fn new(factory: F, grid: ParamGrid, cv: usize) -> Self {
        Self {
            factory,
            grid,
            cv,
            shuffle: true,
            seed: 42,
            results: Vec::new(),
            best_index: None,
            best_estimator: None,
        }
    }

    /// 执行网格搜索：训练并评估每个 (候选, 折) 组合，然后用最优参数重新训练
    pub fn fit(&mut self, client: &ClusterClient, x: &DenseMatrix, y: &[f32]) -> Result<()> {
        if y.len() != x.n_rows {
            return Err(Error::DataError(format!(
                "标签数 {} 与样本数 {} 不匹配",
                y.len(),
                x.n_rows
            )));
        }
        if self.grid.axes.is_empty() {
            return Err(Error::ConfigError("参数网格为空".to_string()));
        }
        let candidates = self.grid.candidates();
        let folds = kfold_indices(x.n_rows, self.cv, self.shuffle, self.seed)?;

        let n_folds = folds.len();
        let cells: Vec<(usize, usize)> = (0..candidates.len())
            .flat_map(|ci| (0..n_folds).map(move |fi| (ci, fi)))
            .collect();
        println!(
            "网格搜索: {} 个候选参数 × {} 折交叉验证，共 {} 个任务",
            candidates.len(),
            n_folds,
            cells.len()
        );

        let factory = &self.factory;
        let candidates_ref = &candidates;
        let folds_ref = &folds;
        let scores = client.map("grid_cell", cells, |_, (ci, fi)| {
            let params = &candidates_ref[ci];
            let (train_idx, test_idx) = &folds_ref[fi];
            let mut estimator = factory(params);
            let x_train = x.gather_rows(train_idx)?;
            let y_train = gather(y, train_idx);
            estimator.fit(&x_train, &y_train)?;
            let x_test = x.gather_rows(test_idx)?;
            let y_test = gather(y, test_idx);
            estimator.score(&x_test, &y_test)
        })?;

        let mut results = Vec::with_capacity(candidates.len());
        for (ci, params) in candidates.iter().enumerate() {
            let fold_scores: Vec<f32> = scores[ci * n_folds..(ci + 1) * n_folds].to_vec();
            let mean_score = fold_scores.iter().sum::<f32>() / n_folds as f32;
            let variance = fold_scores
                .iter()
                .map(|s| (s - mean_score) * (s - mean_score))
                .sum::<f32>()
                / n_folds as f32;
            results.push(CandidateResult {
                params: params.clone(),
                fold_scores,
                mean_score,
                std_score: variance.sqrt(),
            });
        }

        let mut best_index = 0;
        for (i, result) in results.iter().enumerate() {
            if result.mean_score > results[best_index].mean_score {
                best_index = i;
            }
        }

        // 用最优参数在全部数据上重新训练
        let mut best_estimator = (self.factory)(&results[best_index].params);
        best_estimator.fit(x, y)?;

        println!(
            "网格搜索完成: 最优参数 {:?}，平均评分 {:.4}",
            results[best_index].params, results[best_index].mean_score
        );
        self.results = results;
        self.best_index = Some(best_index);
        self.best_estimator = Some(best_estimator);
        Ok(())
    }

    /// 交叉验证结果，按平均评分降序
    pub fn cv_results(&self) -> Vec<CandidateResult> {
        let mut sorted = self.results.clone();
        sorted.sort_by(|a, b| b.mean_score.partial_cmp(&a.mean_score).unwrap());
        sorted
    }

    pub fn best_params(&self) -> Option<&ParamSet> {
        self.best_index.map(|i| &self.results[i].params)
    }

    pub fn best_score(&self) -> Option<f32> {
        self.best_index.map(|i| self.results[i].mean_score)
    }

    pub fn best_estimator(&self) -> Option<&E> {
        self.best_estimator.as_ref()
    }
}

/// 按下标列表收集标签
fn gather(values: &[f32], indices: &[usize]) -> Vec<f32> {
    indices.iter().map(|&i| values[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClusterConfig;
    use crate::datasets::make_classification;
    use crate::linear::SgdClassifier;

    fn test_client() -> ClusterClient {
        let config = ClusterConfig {
            n_workers: 2,
            threads_per_worker: 2,
            memory_limit_mb: 64,
        };
        ClusterClient::new(config).unwrap()
    }

    #[test]
    fn test_param_grid_cartesian_product() {
        let grid = ParamGrid::new()
            .add("alpha", vec![0.1, 0.2])
            .add("learning_rate", vec![0.01, 0.1, 1.0]);
        let candidates = grid.candidates();
        assert_eq!(candidates.len(), 6);
        for params in &candidates {
            assert!(params.contains_key("alpha"));
            assert!(params.contains_key("learning_rate"));
        }
    }

    #[test]
    fn test_kfold_partition_invariants() {
        let folds = kfold_indices(10, 3, true, 0).unwrap();
        assert_eq!(folds.len(), 3);
        assert_eq!(folds[0].1.len(), 4);
        assert_eq!(folds[1].1.len(), 3);

        let mut all_test: Vec<usize> = folds.iter().flat_map(|(_, test)| test.clone()).collect();
        all_test.sort();
        assert_eq!(all_test, (0..10).collect::<Vec<_>>());

        for (train, test) in &folds {
            assert_eq!(train.len() + test.len(), 10);
            for i in test {
                assert!(!train.contains(i));
            }
        }
    }

    #[test]
    fn test_kfold_rejects_bad_params() {
        assert!(kfold_indices(10, 1, false, 0).is_err());
        assert!(kfold_indices(3, 5, false, 0).is_err());
    }

    #[test]
    fn test_grid_search_picks_better_alpha() {
        let client = test_client();
        let (x, y) = make_classification(150, 4, 2, 4.0, 21).unwrap();

        // alpha=10 时正则化完全压制学习，准确率接近随机
        let grid = ParamGrid::new().add("alpha", vec![0.0001, 10.0]);
        let factory = |params: &ParamSet| {
            let mut model = SgdClassifier::new();
            model.set_alpha(param_or(params, "alpha", 0.0001) as f32);
            model.set_n_epochs(10);
            model
        };
        let mut search = GridSearchCV::new(factory, grid, 3);
        search.fit(&client, &x, &y).unwrap();

        let best = search.best_params().unwrap();
        assert!((param_or(best, "alpha", -1.0) - 0.0001).abs() < 1e-9);
        assert!(search.best_score().unwrap() > 0.85);

        let results = search.cv_results();
        assert_eq!(results.len(), 2);
        assert!(results[0].mean_score >= results[1].mean_score);

        // 最优估计器已在全部数据上重新训练
        let refit_score = search.best_estimator().unwrap().score(&x, &y).unwrap();
        assert!(refit_score > 0.85);
    }

    #[test]
    fn test_grid_search_rejects_empty_grid() {
        let client = test_client();
        let (x, y) = make_classification(30, 3, 2, 2.0, 2).unwrap();
        let mut search = GridSearchCV::new(|_: &ParamSet| SgdClassifier::new(), ParamGrid::new(), 3);
        assert!(search.fit(&client, &x, &y).is_err());
    }
}
