// types.rs
// 定义通用数据类型，如行主序稠密矩阵及其辅助操作。
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// 行主序稠密矩阵，元素为 f32
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseMatrix {
    /// 行主序存储的元素
    pub data: Vec<f32>,
    /// 行数
    pub n_rows: usize,
    /// 列数
    pub n_cols: usize,
}

impl DenseMatrix {
    /// 由行主序数据创建矩阵，校验数据长度
    pub fn new(data: Vec<f32>, n_rows: usize, n_cols: usize) -> Result<Self> {
        if data.len() != n_rows * n_cols {
            return Err(Error::DataError(format!(
                "数据长度 {} 与矩阵形状 {}x{} 不匹配",
                data.len(),
                n_rows,
                n_cols
            )));
        }
        Ok(Self { data, n_rows, n_cols })
    }

    /// 创建全零矩阵
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Self {
            data: vec![0.0; n_rows * n_cols],
            n_rows,
            n_cols,
        }
    }

    /// 由行向量列表创建矩阵，要求各行长度一致
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::DataError("行列表为空".to_string()));
        }
        let n_cols = rows[0].len();
        let mut data = Vec::with_capacity(rows.len() * n_cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(Error::DataError(format!(
                    "第 {} 行长度 {} 与首行长度 {} 不一致",
                    i,
                    row.len(),
                    n_cols
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            n_rows: rows.len(),
            n_cols,
        })
    }

    /// 矩阵形状 (行数, 列数)
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    /// 取第 i 行
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.n_cols..(i + 1) * self.n_cols]
    }

    /// 按行迭代
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks(self.n_cols)
    }

    /// 按给定行号列表收集行，组成新矩阵
    pub fn gather_rows(&self, indices: &[usize]) -> Result<DenseMatrix> {
        let mut data = Vec::with_capacity(indices.len() * self.n_cols);
        for &i in indices {
            if i >= self.n_rows {
                return Err(Error::DataError(format!(
                    "行号 {} 超出范围 [0, {})",
                    i, self.n_rows
                )));
            }
            data.extend_from_slice(self.row(i));
        }
        DenseMatrix::new(data, indices.len(), self.n_cols)
    }

    /// 截取行区间 [start, end)，组成新矩阵
    pub fn slice_rows(&self, start: usize, end: usize) -> Result<DenseMatrix> {
        if start > end || end > self.n_rows {
            return Err(Error::DataError(format!(
                "行区间 [{}, {}) 超出范围 [0, {})",
                start, end, self.n_rows
            )));
        }
        let data = self.data[start * self.n_cols..end * self.n_cols].to_vec();
        DenseMatrix::new(data, end - start, self.n_cols)
    }

    /// 矩阵数据占用的字节数，用于内存上限检查
    pub fn byte_size(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }
}

/// 两个向量的平方欧氏距离
pub fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}
