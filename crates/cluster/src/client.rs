// client.rs
// 集群客户端，负责启动工作进程池并将独立任务分发到各工作线程。
use crate::config::ClusterConfig;
use crate::error::{Error, Result};
use crate::task::{TaskRecord, TaskStatus};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::thread;
use std::time::Instant;
use uuid::Uuid;

/// 单个工作进程的统计信息
#[derive(Debug, Clone)]
pub struct WorkerStats {
    pub worker_id: usize,
    /// 成功完成的任务数
    pub completed: usize,
    /// 失败的任务数
    pub failed: usize,
    /// 累计执行耗时（毫秒）
    pub busy_ms: u64,
}

/// 集群客户端，持有工作进程池的配置与任务历史。
/// 任务通过线程安全的FIFO队列分发，每个工作进程包含若干执行线程。
pub struct ClusterClient {
    /// 集群配置
    pub config: ClusterConfig,
    /// 已调度任务的历史记录，线程安全
    history: Mutex<Vec<TaskRecord>>,
}

impl ClusterClient {
    /// 按给定配置启动集群客户端
    pub fn new(config: ClusterConfig) -> Result<Self> {
        config.validate()?;
        println!(
            "集群已启动: {} 个工作进程 × {} 线程，每进程内存上限 {} MB",
            config.n_workers, config.threads_per_worker, config.memory_limit_mb
        );
        Ok(Self {
            config,
            history: Mutex::new(Vec::new()),
        })
    }

    /// 集群总执行线程数
    pub fn total_threads(&self) -> usize {
        self.config.total_threads()
    }

    /// 检查单个任务负载是否超过工作进程内存上限
    pub fn check_payload(&self, payload_bytes: usize) -> Result<()> {
        if payload_bytes > self.config.memory_limit_bytes() {
            return Err(Error::ClusterError(format!(
                "任务负载 {} 字节超过工作进程内存上限 {} 字节",
                payload_bytes,
                self.config.memory_limit_bytes()
            )));
        }
        Ok(())
    }

    /// 将一组独立任务分发到工作进程池并收集结果。
    /// 结果顺序与输入顺序一致；任何任务失败时返回第一个错误。
    pub fn map<T, R, F>(&self, label: &str, items: Vec<T>, f: F) -> Result<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn(usize, T) -> Result<R> + Sync,
    {
        let n = items.len();
        if n == 0 {
            return Ok(Vec::new());
        }

        // 任务队列，线程安全（FIFO）
        let queue: Mutex<VecDeque<(usize, T)>> = Mutex::new(items.into_iter().enumerate().collect());
        let slots: Mutex<Vec<Option<Result<R>>>> = Mutex::new((0..n).map(|_| None).collect());
        let records: Mutex<Vec<TaskRecord>> = Mutex::new(Vec::with_capacity(n));
        let f = &f;

        let n_threads = std::cmp::min(self.total_threads(), n);
        thread::scope(|s| {
            for thread_idx in 0..n_threads {
                let worker_id = thread_idx / self.config.threads_per_worker;
                let queue = &queue;
                let slots = &slots;
                let records = &records;
                s.spawn(move || loop {
                    let next = queue.lock().unwrap().pop_front();
                    let (idx, value) = match next {
                        Some(pair) => pair,
                        None => break,
                    };

                    let task_id = format!("{}_{}", label, Uuid::new_v4());
                    let mut record = TaskRecord::new(task_id, label.to_string(), worker_id);
                    record.status = TaskStatus::Running;

                    let start = Instant::now();
                    let outcome = f(idx, value);
                    record.elapsed_ms = start.elapsed().as_millis() as u64;
                    record.status = match &outcome {
                        Ok(_) => TaskStatus::Completed,
                        Err(e) => TaskStatus::Failed(e.to_string()),
                    };

                    records.lock().unwrap().push(record);
                    slots.lock().unwrap()[idx] = Some(outcome);
                });
            }
        });

        self.history.lock().unwrap().extend(records.into_inner().unwrap());

        let mut results = Vec::with_capacity(n);
        for slot in slots.into_inner().unwrap() {
            match slot {
                Some(Ok(value)) => results.push(value),
                Some(Err(e)) => return Err(e),
                None => return Err(Error::ClusterError("任务未被执行".to_string())),
            }
        }
        Ok(results)
    }

    /// 获取所有已调度任务的历史记录
    pub fn task_history(&self) -> Vec<TaskRecord> {
        self.history.lock().unwrap().clone()
    }

    /// 清空任务历史记录
    pub fn clear_history(&self) {
        self.history.lock().unwrap().clear();
    }

    /// 按工作进程汇总任务统计
    pub fn worker_stats(&self) -> Vec<WorkerStats> {
        let mut stats: Vec<WorkerStats> = (0..self.config.n_workers)
            .map(|worker_id| WorkerStats {
                worker_id,
                completed: 0,
                failed: 0,
                busy_ms: 0,
            })
            .collect();
        for record in self.history.lock().unwrap().iter() {
            if record.worker_id >= stats.len() {
                continue;
            }
            let entry = &mut stats[record.worker_id];
            if record.is_completed() {
                entry.completed += 1;
            } else if record.is_failed() {
                entry.failed += 1;
            }
            entry.busy_ms += record.elapsed_ms;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(n_workers: usize) -> ClusterClient {
        let config = ClusterConfig {
            n_workers,
            threads_per_worker: 1,
            memory_limit_mb: 64,
        };
        ClusterClient::new(config).unwrap()
    }

    #[test]
    fn test_map_preserves_order() {
        let client = test_client(4);
        let items: Vec<usize> = (0..100).collect();
        let results = client.map("square", items, |_, x| Ok(x * x)).unwrap();
        assert_eq!(results.len(), 100);
        for (i, value) in results.iter().enumerate() {
            assert_eq!(*value, i * i);
        }
    }

    #[test]
    fn test_map_records_history() {
        let client = test_client(2);
        let items: Vec<usize> = (0..10).collect();
        client.map("noop", items, |_, x| Ok(x)).unwrap();

        let history = client.task_history();
        assert_eq!(history.len(), 10);
        assert!(history.iter().all(|r| r.is_completed()));
        assert!(history.iter().all(|r| r.label == "noop"));

        let stats = client.worker_stats();
        let total: usize = stats.iter().map(|s| s.completed).sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn test_map_propagates_error() {
        let client = test_client(2);
        let items: Vec<usize> = (0..8).collect();
        let result = client.map("maybe_fail", items, |_, x| {
            if x == 3 {
                Err(Error::Other("模拟任务失败".to_string()))
            } else {
                Ok(x)
            }
        });
        assert!(result.is_err());
        // 失败任务同样进入历史记录
        let failed = client.task_history().iter().filter(|r| r.is_failed()).count();
        assert_eq!(failed, 1);
    }

    #[test]
    fn test_check_payload() {
        let client = test_client(1);
        assert!(client.check_payload(1024).is_ok());
        assert!(client.check_payload(65 * 1024 * 1024).is_err());
    }

    #[test]
    fn test_map_empty_items() {
        let client = test_client(2);
        let results = client.map("empty", Vec::<usize>::new(), |_, x| Ok(x)).unwrap();
        assert!(results.is_empty());
    }
}
