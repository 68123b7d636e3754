use cluster::client::ClusterClient;
use cluster::config::ClusterConfig;
use cluster::datasets::make_classification;
use cluster::estimator::Estimator;
use cluster::grid_search::{param_or, GridSearchCV, ParamGrid, ParamSet};
use cluster::linear::SgdClassifier;
use prettytable::{row, Table};

/// 分布式网格搜索演示：每个 (候选参数, 折) 组合作为一个集群任务并行评估
fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== 网格搜索交叉验证演示 ===");

    // ---- 1. 启动集群 ----
    let client = ClusterClient::new(ClusterConfig::default())?;

    // ---- 2. 生成数据集 ----
    let (x, y) = make_classification(600, 6, 3, 2.0, 31)?;
    println!("数据集: {} 行 × {} 列", x.n_rows, x.n_cols);

    // ---- 3. 构建参数网格并搜索 ----
    let grid = ParamGrid::new()
        .add("alpha", vec![0.0001, 0.01, 1.0])
        .add("learning_rate", vec![0.01, 0.1]);
    let factory = |params: &ParamSet| {
        let mut model = SgdClassifier::new();
        model.set_alpha(param_or(params, "alpha", 0.0001) as f32);
        model.set_learning_rate(param_or(params, "learning_rate", 0.1) as f32);
        model.set_n_epochs(10);
        model
    };
    let mut search = GridSearchCV::new(factory, grid, 5);
    search.fit(&client, &x, &y)?;

    // ---- 4. 打印交叉验证结果 ----
    let mut table = Table::new();
    table.add_row(row!["alpha", "learning_rate", "平均评分", "标准差"]);
    for result in search.cv_results() {
        table.add_row(row![
            param_or(&result.params, "alpha", 0.0),
            param_or(&result.params, "learning_rate", 0.0),
            format!("{:.4}", result.mean_score),
            format!("{:.4}", result.std_score)
        ]);
    }
    table.printstd();

    if let Some(best) = search.best_params() {
        println!("最优参数: {}", serde_json::to_string_pretty(best)?);
    }
    if let Some(estimator) = search.best_estimator() {
        println!("重训后全集准确率: {:.4}", estimator.score(&x, &y)?);
    }

    // ---- 5. 工作进程统计 ----
    let mut stats_table = Table::new();
    stats_table.add_row(row!["工作进程", "完成任务数", "失败任务数", "累计耗时(ms)"]);
    for stats in client.worker_stats() {
        stats_table.add_row(row![stats.worker_id, stats.completed, stats.failed, stats.busy_ms]);
    }
    stats_table.printstd();
    Ok(())
}
