// config.rs
// 集群全局配置结构体及其默认实现，包含工作进程数、每进程线程数和内存上限。
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 集群全局配置，控制工作进程数、每进程线程数和每进程内存上限
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// 工作进程数
    pub n_workers: usize,
    /// 每个工作进程的线程数
    pub threads_per_worker: usize,
    /// 每个工作进程的内存上限（MB），单个任务负载超过该值会被拒绝
    pub memory_limit_mb: usize,
}

impl Default for ClusterConfig {
    /// 默认配置：4个工作进程，每进程1线程，内存上限512MB
    fn default() -> Self {
        Self {
            n_workers: 4,
            threads_per_worker: 1,
            memory_limit_mb: 512,
        }
    }
}

/// 用于直接反序列化集群配置 JSON 文件的结构体
/// 使用 serde 属性来处理字段名不匹配的问题 (e.g., "workers" -> n_workers)
#[derive(Debug, Deserialize)]
pub(crate) struct ClusterConfigJson {
    #[serde(rename = "workers")]
    n_workers: usize,
    #[serde(default = "default_threads")]
    threads_per_worker: usize,
    memory_limit_mb: usize,
}

fn default_threads() -> usize {
    1
}

// 为 ClusterConfigJson 实现一个转换方法，使其可以轻松地转为 ClusterConfig
impl From<ClusterConfigJson> for ClusterConfig {
    fn from(config_json: ClusterConfigJson) -> Self {
        Self {
            n_workers: config_json.n_workers,
            threads_per_worker: config_json.threads_per_worker,
            memory_limit_mb: config_json.memory_limit_mb,
        }
    }
}

impl ClusterConfig {
    /// 校验配置参数是否合法
    pub fn validate(&self) -> Result<()> {
        if self.n_workers == 0 {
            return Err(Error::ConfigError("工作进程数必须大于0".to_string()));
        }
        if self.threads_per_worker == 0 {
            return Err(Error::ConfigError("每进程线程数必须大于0".to_string()));
        }
        if self.memory_limit_mb == 0 {
            return Err(Error::ConfigError("内存上限必须大于0".to_string()));
        }
        Ok(())
    }

    /// 从 JSON 配置文件加载集群配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| Error::ConfigError(format!("无法读取配置文件: {}", e)))?;
        let config_json: ClusterConfigJson = serde_json::from_str(&contents)
            .map_err(|e| Error::ConfigError(format!("解析配置文件失败: {}", e)))?;
        let config = ClusterConfig::from(config_json);
        config.validate()?;
        Ok(config)
    }

    /// 内存上限（字节）
    pub fn memory_limit_bytes(&self) -> usize {
        self.memory_limit_mb * 1024 * 1024
    }

    /// 集群总线程数
    pub fn total_threads(&self) -> usize {
        self.n_workers * self.threads_per_worker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ClusterConfig::default();
        assert_eq!(config.n_workers, 4);
        assert_eq!(config.threads_per_worker, 1);
        assert_eq!(config.memory_limit_mb, 512);
        assert!(config.validate().is_ok());
        assert_eq!(config.total_threads(), 4);
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let config = ClusterConfig {
            n_workers: 0,
            threads_per_worker: 1,
            memory_limit_mb: 256,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        // JSON 中使用 "workers" 字段名，threads_per_worker 省略时取默认值
        write!(file, r#"{{"workers": 2, "memory_limit_mb": 128}}"#).unwrap();
        let config = ClusterConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.n_workers, 2);
        assert_eq!(config.threads_per_worker, 1);
        assert_eq!(config.memory_limit_bytes(), 128 * 1024 * 1024);
    }

    #[test]
    fn test_from_json_file_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"workers": 0, "memory_limit_mb": 128}}"#).unwrap();
        assert!(ClusterConfig::from_json_file(file.path()).is_err());
    }
}
