use serde::{Deserialize, Serialize};

/// 任务状态枚举，描述任务的生命周期
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TaskStatus {
    /// 等待执行
    Pending,
    /// 正在执行
    Running,
    /// 已完成
    Completed,
    /// 执行失败，包含失败原因
    Failed(String),
}

/// 任务记录结构体，记录一次计算任务的调度信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    /// 任务唯一ID
    pub task_id: String,
    /// 任务所属操作的标签（如 "kmeans_assign"、"grid_cell"）
    pub label: String,
    /// 执行该任务的工作进程ID
    pub worker_id: usize,
    /// 当前任务状态
    pub status: TaskStatus,
    /// 执行耗时（毫秒），仅在任务结束后有意义
    pub elapsed_ms: u64,
}

impl TaskRecord {
    /// 创建新的任务记录，初始状态为等待执行
    pub fn new(task_id: String, label: String, worker_id: usize) -> Self {
        Self {
            task_id,
            label,
            worker_id,
            status: TaskStatus::Pending,
            elapsed_ms: 0,
        }
    }

    /// 任务是否成功完成
    pub fn is_completed(&self) -> bool {
        matches!(self.status, TaskStatus::Completed)
    }

    /// 任务是否失败
    pub fn is_failed(&self) -> bool {
        matches!(self.status, TaskStatus::Failed(_))
    }
}
