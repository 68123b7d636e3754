// chunked.rs
// 分块矩阵，将大矩阵按行拆分为多个块，以便分发到集群工作进程。
use crate::client::ClusterClient;
use crate::error::{Error, Result};
use crate::types::DenseMatrix;
use serde::{Deserialize, Serialize};

/// 分块矩阵：按行划分的矩阵块集合。
/// 末尾块允许不足 chunk_rows 行，不做填充，保证与目标向量按行对齐。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkedMatrix {
    /// 各行块
    pub chunks: Vec<DenseMatrix>,
    /// 每块的标准行数
    pub chunk_rows: usize,
    /// 总行数
    pub n_rows: usize,
    /// 列数
    pub n_cols: usize,
}

impl ChunkedMatrix {
    /// 将稠密矩阵按行拆分为块
    pub fn from_dense(matrix: DenseMatrix, chunk_rows: usize) -> Result<Self> {
        if chunk_rows == 0 {
            return Err(Error::DataError("块行数必须大于0".to_string()));
        }
        if matrix.n_rows == 0 {
            return Err(Error::DataError("矩阵为空，无法分块".to_string()));
        }

        let n_rows = matrix.n_rows;
        let n_cols = matrix.n_cols;
        let n_chunks = (n_rows + chunk_rows - 1) / chunk_rows; // 向上取整
        let mut chunks = Vec::with_capacity(n_chunks);
        for chunk_id in 0..n_chunks {
            let start = chunk_id * chunk_rows;
            let end = std::cmp::min(start + chunk_rows, n_rows);
            chunks.push(matrix.slice_rows(start, end)?);
        }

        println!("矩阵按行拆分为 {} 个块，每块 {} 行", chunks.len(), chunk_rows);
        Ok(Self {
            chunks,
            chunk_rows,
            n_rows,
            n_cols,
        })
    }

    /// 块数
    pub fn n_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// 取第 i 个块
    pub fn chunk(&self, i: usize) -> &DenseMatrix {
        &self.chunks[i]
    }

    /// 取全局第 i 行（跨块索引）
    pub fn row(&self, i: usize) -> &[f32] {
        let chunk_id = i / self.chunk_rows;
        let offset = i - chunk_id * self.chunk_rows;
        self.chunks[chunk_id].row(offset)
    }

    /// 第 i 个块覆盖的行区间 [start, end)，用于切取对齐的目标向量
    pub fn chunk_range(&self, i: usize) -> (usize, usize) {
        let start = i * self.chunk_rows;
        let end = std::cmp::min(start + self.chunk_rows, self.n_rows);
        (start, end)
    }

    /// 合并所有块，还原为稠密矩阵
    pub fn to_dense(&self) -> DenseMatrix {
        let mut data = Vec::with_capacity(self.n_rows * self.n_cols);
        for chunk in &self.chunks {
            data.extend_from_slice(&chunk.data);
        }
        DenseMatrix {
            data,
            n_rows: self.n_rows,
            n_cols: self.n_cols,
        }
    }

    /// 按新的块行数重新分块
    pub fn rechunk(&self, chunk_rows: usize) -> Result<Self> {
        ChunkedMatrix::from_dense(self.to_dense(), chunk_rows)
    }

    /// 将每个块作为一个任务分发到集群，收集各块结果。
    /// 分发前按内存上限逐块检查负载。
    pub fn map_chunks<R, F>(&self, client: &ClusterClient, label: &str, f: F) -> Result<Vec<R>>
    where
        R: Send,
        F: Fn(usize, &DenseMatrix) -> Result<R> + Sync,
    {
        for chunk in &self.chunks {
            client.check_payload(chunk.byte_size())?;
        }
        let items: Vec<(usize, &DenseMatrix)> = self.chunks.iter().enumerate().collect();
        client.map(label, items, |_, (chunk_id, chunk)| f(chunk_id, chunk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClusterConfig;

    #[test]
    fn test_from_dense_chunk_layout() {
        let matrix = DenseMatrix::zeros(10, 3);
        let chunked = ChunkedMatrix::from_dense(matrix, 4).unwrap();
        assert_eq!(chunked.n_chunks(), 3);
        assert_eq!(chunked.chunk(0).n_rows, 4);
        assert_eq!(chunked.chunk(2).n_rows, 2); // 末尾块不足时不填充
        assert_eq!(chunked.chunk_range(0), (0, 4));
        assert_eq!(chunked.chunk_range(2), (8, 10));
    }

    #[test]
    fn test_to_dense_round_trip() {
        let data: Vec<f32> = (0..30).map(|x| x as f32).collect();
        let matrix = DenseMatrix::new(data, 10, 3).unwrap();
        let chunked = ChunkedMatrix::from_dense(matrix.clone(), 3).unwrap();
        assert_eq!(chunked.to_dense(), matrix);

        let rechunked = chunked.rechunk(5).unwrap();
        assert_eq!(rechunked.n_chunks(), 2);
        assert_eq!(rechunked.to_dense(), matrix);
    }

    #[test]
    fn test_from_dense_rejects_bad_input() {
        assert!(ChunkedMatrix::from_dense(DenseMatrix::zeros(10, 2), 0).is_err());
        assert!(ChunkedMatrix::from_dense(DenseMatrix::zeros(0, 2), 4).is_err());
    }

    #[test]
    fn test_map_chunks_row_sums() {
        let config = ClusterConfig {
            n_workers: 2,
            threads_per_worker: 2,
            memory_limit_mb: 16,
        };
        let client = ClusterClient::new(config).unwrap();
        let data: Vec<f32> = (0..20).map(|x| x as f32).collect();
        let matrix = DenseMatrix::new(data, 10, 2).unwrap();
        let chunked = ChunkedMatrix::from_dense(matrix, 4).unwrap();

        let sums = chunked
            .map_chunks(&client, "row_sum", |_, chunk| {
                Ok(chunk.data.iter().sum::<f32>())
            })
            .unwrap();
        assert_eq!(sums.len(), 3);
        let total: f32 = sums.iter().sum();
        assert!((total - 190.0).abs() < 1e-3);
    }

    #[test]
    fn test_map_chunks_memory_limit() {
        let config = ClusterConfig {
            n_workers: 1,
            threads_per_worker: 1,
            memory_limit_mb: 1,
        };
        let client = ClusterClient::new(config).unwrap();
        // 单块 400x1000 f32 = 1.6MB，超过 1MB 上限
        let matrix = DenseMatrix::zeros(400, 1000);
        let chunked = ChunkedMatrix::from_dense(matrix, 400).unwrap();
        let result = chunked.map_chunks(&client, "oversized", |_, _| Ok(()));
        assert!(result.is_err());
    }
}
