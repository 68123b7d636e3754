// main.rs
// 端到端演示程序：启动集群，依次演示分块 k-means、增量训练、文本流水线与网格搜索。
use anyhow::{Context, Result};
use cluster::chunked::ChunkedMatrix;
use cluster::client::ClusterClient;
use cluster::config::ClusterConfig;
use cluster::datasets::{builtin_corpus, make_blobs, make_classification};
use cluster::estimator::Estimator;
use cluster::grid_search::{param_or, GridSearchCV, ParamGrid, ParamSet};
use cluster::incremental::Incremental;
use cluster::kmeans::KMeans;
use cluster::linear::SgdClassifier;
use cluster::pipeline::TextPipeline;
use cluster::vectorizer::HashingVectorizer;
use prettytable::{row, Table};
use uuid::Uuid;

fn main() -> Result<()> {
    println!("=== 分布式机器学习扩展演示 ===");
    println!("本次运行ID: run_{}", Uuid::new_v4());

    // ---- 1. 启动集群 ----
    // 优先读取本地 cluster.json，不存在时使用默认配置
    let config = match ClusterConfig::from_json_file("cluster.json") {
        Ok(config) => config,
        Err(_) => {
            println!("未找到 cluster.json，使用默认集群配置");
            ClusterConfig::default()
        }
    };
    let client = ClusterClient::new(config).context("集群启动失败")?;

    kmeans_section(&client).context("k-means 演示失败")?;
    incremental_section().context("增量训练演示失败")?;
    text_section().context("文本流水线演示失败")?;
    grid_search_section(&client).context("网格搜索演示失败")?;
    worker_summary(&client);

    println!("\n=== 演示结束 ===");
    Ok(())
}

/// 分块 k-means：数据按行分块后，每轮迭代的指派任务分发到集群
fn kmeans_section(client: &ClusterClient) -> Result<()> {
    println!("\n--- 1. 分块数据上的 k-means|| 聚类 ---");
    let (matrix, _) = make_blobs(3000, 8, 4, 1.2, 17)?;
    println!("数据集: {} 行 × {} 列", matrix.n_rows, matrix.n_cols);
    let chunked = ChunkedMatrix::from_dense(matrix, 500)?;

    let mut model = KMeans::new(4);
    model.fit(client, &chunked)?;

    let mut table = Table::new();
    table.add_row(row!["聚类", "样本数"]);
    for (cluster_id, size) in model.cluster_sizes().iter().enumerate() {
        table.add_row(row![cluster_id, size]);
    }
    table.printstd();
    println!("迭代 {} 轮，惯性 {:.2}", model.n_iter, model.inertia);
    Ok(())
}

/// 增量训练：按块喂入 partial_fit，记录验证集学习曲线
fn incremental_section() -> Result<()> {
    println!("\n--- 2. 增量训练 SGD 分类器 ---");
    let (x_train, y_train) = make_classification(4000, 10, 5, 3.0, 23)?;
    let (x_val, y_val) = make_classification(800, 10, 5, 3.0, 24)?;
    let chunked = ChunkedMatrix::from_dense(x_train, 500)?;

    let mut classifier = SgdClassifier::new();
    classifier.set_learning_rate(0.5);
    let mut incremental = Incremental::new(classifier, vec![0.0, 1.0]);
    incremental.fit(&chunked, &y_train, Some((&x_val, &y_val)))?;

    let mut table = Table::new();
    table.add_row(row!["已处理块数", "验证集准确率"]);
    for (block, score) in incremental.score_history().iter().enumerate() {
        table.add_row(row![block + 1, format!("{:.4}", score)]);
    }
    table.printstd();
    Ok(())
}

/// 文本流水线：哈希向量化 + SGD 分类器
fn text_section() -> Result<()> {
    println!("\n--- 3. 文本分类流水线 ---");
    let corpus = builtin_corpus();
    println!("类别: {:?}，文档数: {}", corpus.target_names, corpus.len());

    let mut classifier = SgdClassifier::new();
    classifier.set_learning_rate(0.5);
    classifier.set_n_epochs(30);
    let mut pipeline = TextPipeline::new(HashingVectorizer::new(512), classifier);
    pipeline.fit(&corpus.data, &corpus.target)?;
    println!(
        "训练集准确率: {:.4}",
        pipeline.score(&corpus.data, &corpus.target)?
    );
    Ok(())
}

/// 网格搜索：每个 (候选参数, 折) 组合并行评估
fn grid_search_section(client: &ClusterClient) -> Result<()> {
    println!("\n--- 4. 分布式网格搜索 ---");
    let (x, y) = make_classification(600, 6, 3, 2.0, 31)?;

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
    search.fit(client, &x, &y)?;

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
    Ok(())
}

/// 打印各工作进程的任务统计
fn worker_summary(client: &ClusterClient) {
    println!("\n--- 5. 工作进程统计 ---");
    let mut table = Table::new();
    table.add_row(row!["工作进程", "完成任务数", "失败任务数", "累计耗时(ms)"]);
    for stats in client.worker_stats() {
        table.add_row(row![
            stats.worker_id,
            stats.completed,
            stats.failed,
            stats.busy_ms
        ]);
    }
    table.printstd();
}
