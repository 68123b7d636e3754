// kmeans.rs
// 可扩展 K-Means 聚类，支持 k-means|| 初始化与按块并行的 Lloyd 迭代。
use crate::chunked::ChunkedMatrix;
use crate::client::ClusterClient;
use crate::error::{Error, Result};
use crate::types::{squared_distance, DenseMatrix};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// 聚类中心初始化策略
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum KMeansInit {
    /// 随机选取 k 个样本作为初始中心
    Random,
    /// k-means|| 初始化：分轮超采样候选中心，再加权归约为 k 个
    Parallel {
        /// 每轮期望采样数为 oversampling_factor * k
        oversampling_factor: f32,
        /// 采样轮数
        rounds: usize,
    },
}

/// K-Means 聚类器。
/// fit 在分块矩阵上执行：每轮迭代把各块的指派与部分和作为任务分发到集群，
/// 在驱动端归约后更新中心，直到中心移动小于 tol 或达到 max_iter。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeans {
    /// 聚类数
    pub n_clusters: usize,
    /// 初始化策略
    pub init: KMeansInit,
    /// 最大迭代轮数
    pub max_iter: usize,
    /// 收敛阈值（中心移动距离）
    pub tol: f32,
    /// 随机种子
    pub seed: u64,
    /// 聚类中心，训练后有值
    centers: Option<DenseMatrix>,
    /// 最终惯性（各样本到所属中心的平方距离之和）
    pub inertia: f32,
    /// 实际迭代轮数
    pub n_iter: usize,
    /// 各聚类的样本数
    cluster_sizes: Vec<usize>,
}

impl KMeans {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            init: KMeansInit::Parallel {
                oversampling_factor: 2.0,
                rounds: 5,
            },
            max_iter: 50,
            tol: 1e-4,
            seed: 42,
            centers: None,
            inertia: 0.0,
            n_iter: 0,
            cluster_sizes: Vec::new(),
        }
    }

    pub fn set_init(&mut self, init: KMeansInit) {
        self.init = init;
    }

    pub fn set_max_iter(&mut self, max_iter: usize) {
        self.max_iter = max_iter;
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }

    /// 聚类中心
    pub fn centers(&self) -> Option<&DenseMatrix> {
        self.centers.as_ref()
    }

    /// 各聚类的样本数（最后一轮迭代的指派结果）
    pub fn cluster_sizes(&self) -> &[usize] {
        &self.cluster_sizes
    }

    /// 在分块矩阵上训练聚类器
    pub fn fit(&mut self, client: &ClusterClient, x: &ChunkedMatrix) -> Result<()> {
        if self.n_clusters == 0 {
            return Err(Error::TrainError("聚类数必须大于0".to_string()));
        }
        if self.n_clusters > x.n_rows {
            return Err(Error::TrainError(format!(
                "聚类数 {} 超过样本数 {}",
                self.n_clusters, x.n_rows
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut centers = match self.init {
            KMeansInit::Random => self.init_random(x, &mut rng)?,
            KMeansInit::Parallel {
                oversampling_factor,
                rounds,
            } => self.init_parallel(client, x, oversampling_factor, rounds, &mut rng)?,
        };

        let k = self.n_clusters;
        let d = x.n_cols;
        for iter in 0..self.max_iter {
            // 每个块作为一个任务：返回 (各中心部分和, 各中心样本数, 块内惯性)
            let partials = x.map_chunks(client, "kmeans_assign", |_, chunk| {
                let mut sums = vec![0.0f32; k * d];
                let mut counts = vec![0usize; k];
                let mut inertia = 0.0f32;
                for row in chunk.rows() {
                    let (best, dist) = nearest_center(row, &centers);
                    for (j, value) in row.iter().enumerate() {
                        sums[best * d + j] += value;
                    }
                    counts[best] += 1;
                    inertia += dist;
                }
                Ok((sums, counts, inertia))
            })?;

            // 归约各块的部分结果
            let mut sums = vec![0.0f32; k * d];
            let mut counts = vec![0usize; k];
            let mut inertia = 0.0f32;
            for (chunk_sums, chunk_counts, chunk_inertia) in partials {
                for (total, part) in sums.iter_mut().zip(chunk_sums.iter()) {
                    *total += part;
                }
                for (total, part) in counts.iter_mut().zip(chunk_counts.iter()) {
                    *total += part;
                }
                inertia += chunk_inertia;
            }

            // 更新中心；空聚类保留原中心
            let mut new_centers = centers.clone();
            let mut shift = 0.0f32;
            for c in 0..k {
                if counts[c] == 0 {
                    continue;
                }
                let mut new_center = vec![0.0f32; d];
                for j in 0..d {
                    new_center[j] = sums[c * d + j] / counts[c] as f32;
                }
                shift += squared_distance(centers.row(c), &new_center);
                new_centers.data[c * d..(c + 1) * d].copy_from_slice(&new_center);
            }
            centers = new_centers;

            self.n_iter = iter + 1;
            self.inertia = inertia;
            self.cluster_sizes = counts;
            if shift.sqrt() < self.tol {
                println!(
                    "k-means 在第 {} 轮收敛，惯性 {:.4}",
                    self.n_iter, self.inertia
                );
                break;
            }
        }

        self.centers = Some(centers);
        Ok(())
    }

    /// 随机初始化：选取 k 个互不相同的样本行
    fn init_random(&self, x: &ChunkedMatrix, rng: &mut StdRng) -> Result<DenseMatrix> {
        let mut indices: Vec<usize> = (0..x.n_rows).collect();
        indices.shuffle(rng);
        let rows: Vec<Vec<f32>> = indices[..self.n_clusters]
            .iter()
            .map(|&i| x.row(i).to_vec())
            .collect();
        DenseMatrix::from_rows(&rows)
    }

    /// k-means|| 初始化。
    /// 每轮以概率 min(1, l*d²/cost) 对各点采样，采样任务按块分发到集群；
    /// 最后按指派样本数加权，在候选集上用加权 k-means++ 归约出 k 个中心。
    fn init_parallel(
        &self,
        client: &ClusterClient,
        x: &ChunkedMatrix,
        oversampling_factor: f32,
        rounds: usize,
        rng: &mut StdRng,
    ) -> Result<DenseMatrix> {
        let k = self.n_clusters;
        let l = (oversampling_factor * k as f32).max(1.0);

        let first = x.row(rng.gen_range(0..x.n_rows)).to_vec();
        let mut candidates: Vec<Vec<f32>> = vec![first];

        for round in 0..rounds {
            let cand_matrix = DenseMatrix::from_rows(&candidates)?;

            // 代价遍历：当前候选集下所有点的平方距离之和
            let costs = x.map_chunks(client, "kmeans_init_cost", |_, chunk| {
                Ok(chunk
                    .rows()
                    .map(|row| nearest_center(row, &cand_matrix).1)
                    .sum::<f32>())
            })?;
            let total_cost: f32 = costs.iter().sum();
            if total_cost <= f32::EPSILON {
                // 所有点都与某候选重合，无需继续采样
                break;
            }

            // 采样遍历：每块使用独立确定性的随机序列
            let base_seed = self
                .seed
                .wrapping_add(0x9e3779b9)
                .wrapping_add(round as u64 * 7919);
            let sampled = x.map_chunks(client, "kmeans_init_sample", |chunk_id, chunk| {
                let mut chunk_rng = StdRng::seed_from_u64(base_seed.wrapping_add(chunk_id as u64));
                let mut picked: Vec<Vec<f32>> = Vec::new();
                for row in chunk.rows() {
                    let d2 = nearest_center(row, &cand_matrix).1;
                    let p = (l * d2 / total_cost).min(1.0);
                    if chunk_rng.gen::<f32>() < p {
                        picked.push(row.to_vec());
                    }
                }
                Ok(picked)
            })?;
            for chunk_picked in sampled {
                candidates.extend(chunk_picked);
            }
        }

        // 候选不足 k 个时补充随机样本行
        while candidates.len() < k {
            candidates.push(x.row(rng.gen_range(0..x.n_rows)).to_vec());
        }
        println!("k-means|| 初始化: 采样得到 {} 个候选中心", candidates.len());

        // 权重遍历：统计指派到每个候选的样本数
        let cand_matrix = DenseMatrix::from_rows(&candidates)?;
        let n_candidates = candidates.len();
        let count_vecs = x.map_chunks(client, "kmeans_init_weight", |_, chunk| {
            let mut counts = vec![0usize; n_candidates];
            for row in chunk.rows() {
                counts[nearest_center(row, &cand_matrix).0] += 1;
            }
            Ok(counts)
        })?;
        let mut weights = vec![0.0f32; n_candidates];
        for counts in count_vecs {
            for (weight, count) in weights.iter_mut().zip(counts.iter()) {
                *weight += *count as f32;
            }
        }

        weighted_kmeanspp(&candidates, &weights, k, rng)
    }

    /// 预测每个样本的所属聚类
    pub fn predict(&self, x: &DenseMatrix) -> Result<Vec<f32>> {
        let centers = self
            .centers
            .as_ref()
            .ok_or_else(|| Error::PredictError("模型尚未训练".to_string()))?;
        if x.n_cols != centers.n_cols {
            return Err(Error::PredictError(format!(
                "特征数 {} 与训练时的 {} 不匹配",
                x.n_cols, centers.n_cols
            )));
        }
        Ok(x.rows()
            .map(|row| nearest_center(row, centers).0 as f32)
            .collect())
    }

    /// 评分为负惯性，越大越好
    pub fn score(&self, x: &DenseMatrix) -> Result<f32> {
        let centers = self
            .centers
            .as_ref()
            .ok_or_else(|| Error::PredictError("模型尚未训练".to_string()))?;
        let inertia: f32 = x.rows().map(|row| nearest_center(row, centers).1).sum();
        Ok(-inertia)
    }
}

/// 找到离给定样本最近的中心，返回 (中心编号, 平方距离)
fn nearest_center(row: &[f32], centers: &DenseMatrix) -> (usize, f32) {
    let mut best = 0;
    let mut best_dist = f32::MAX;
    for (c, center) in centers.rows().enumerate() {
        let dist = squared_distance(row, center);
        if dist < best_dist {
            best = c;
            best_dist = dist;
        }
    }
    (best, best_dist)
}

/// 在加权候选集上执行 k-means++，归约出 k 个中心
fn weighted_kmeanspp(
    candidates: &[Vec<f32>],
    weights: &[f32],
    k: usize,
    rng: &mut StdRng,
) -> Result<DenseMatrix> {
    let mut centers: Vec<Vec<f32>> = Vec::with_capacity(k);
    let first = weighted_pick(weights, rng)
        .unwrap_or_else(|| rng.gen_range(0..candidates.len()));
    centers.push(candidates[first].clone());

    let mut d2: Vec<f32> = candidates
        .iter()
        .map(|c| squared_distance(c, &centers[0]))
        .collect();
    while centers.len() < k {
        let scores: Vec<f32> = d2.iter().zip(weights.iter()).map(|(d, w)| d * w).collect();
        let idx = weighted_pick(&scores, rng)
            .unwrap_or_else(|| rng.gen_range(0..candidates.len()));
        centers.push(candidates[idx].clone());

        let newest = centers.last().expect("centers 非空");
        for (j, candidate) in candidates.iter().enumerate() {
            let dist = squared_distance(candidate, newest);
            if dist < d2[j] {
                d2[j] = dist;
            }
        }
    }
    DenseMatrix::from_rows(&centers)
}

/// 按权重比例随机选取下标；权重全为零时返回 None
fn weighted_pick(weights: &[f32], rng: &mut StdRng) -> Option<usize> {
    let total: f32 = weights.iter().sum();
    if total <= f32::EPSILON {
        return None;
    }
    let mut threshold = rng.gen::<f32>() * total;
    for (i, weight) in weights.iter().enumerate() {
        threshold -= weight;
        if threshold <= 0.0 {
            return Some(i);
        }
    }
    Some(weights.len() - 1)
}
