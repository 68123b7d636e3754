use cluster::chunked::ChunkedMatrix;
use cluster::client::ClusterClient;
use cluster::config::ClusterConfig;
use cluster::datasets::make_blobs;
use cluster::error::Result;
use cluster::kmeans::{KMeans, KMeansInit};
use prettytable::{row, Table};

/// 对比随机初始化与 k-means|| 初始化在同一数据集上的聚类效果
fn main() -> Result<()> {
    println!("=== k-means|| 聚类演示 ===");

    // ---- 1. 启动集群 ----
    let client = ClusterClient::new(ClusterConfig::default())?;

    // ---- 2. 生成团块数据并分块 ----
    let (matrix, _) = make_blobs(3000, 8, 4, 1.2, 17)?;
    println!("数据集: {} 行 × {} 列", matrix.n_rows, matrix.n_cols);
    let chunked = ChunkedMatrix::from_dense(matrix, 500)?;

    // ---- 3. 两种初始化策略分别训练 ----
    let mut table = Table::new();
    table.add_row(row!["初始化策略", "迭代轮数", "惯性", "各聚类样本数"]);
    for (name, init) in [
        ("随机初始化", KMeansInit::Random),
        (
            "k-means||",
            KMeansInit::Parallel {
                oversampling_factor: 2.0,
                rounds: 5,
            },
        ),
    ] {
        let mut model = KMeans::new(4);
        model.set_init(init);
        model.fit(&client, &chunked)?;
        table.add_row(row![
            name,
            model.n_iter,
            format!("{:.2}", model.inertia),
            format!("{:?}", model.cluster_sizes())
        ]);
    }
    table.printstd();

    println!("\n=== 演示结束 ===");
    Ok(())
}
