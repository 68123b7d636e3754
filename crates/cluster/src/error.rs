// error.rs
// 定义项目通用的错误类型（如IO、配置、数据、训练、集群等）和Result类型。
use std::fmt;
use std::io;

/// 项目通用错误类型，涵盖IO、配置、数据、训练、预测、集群等错误
#[derive(Debug)]
pub enum Error {
    /// IO错误
    Io(io::Error),
    /// 配置相关错误
    ConfigError(String),
    /// 数据集或数据形状错误
    DataError(String),
    /// 训练阶段错误
    TrainError(String),
    /// 预测阶段错误
    PredictError(String),
    /// 集群或工作进程相关错误
    ClusterError(String),
    /// 其他类型错误
    Other(String),
}

/// 通用结果类型
pub type Result<T> = std::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::ConfigError(format!("JSON解析失败: {}", e))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "IO错误: {}", e),
            Error::ConfigError(msg) => write!(f, "配置错误: {}", msg),
            Error::DataError(msg) => write!(f, "数据错误: {}", msg),
            Error::TrainError(msg) => write!(f, "训练错误: {}", msg),
            Error::PredictError(msg) => write!(f, "预测错误: {}", msg),
            Error::ClusterError(msg) => write!(f, "集群错误: {}", msg),
            Error::Other(msg) => write!(f, "其他错误: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
