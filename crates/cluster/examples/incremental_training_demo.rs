use anyhow::{Context, Result};
use cluster::chunked::ChunkedMatrix;
use cluster::datasets::make_classification;
use cluster::incremental::Incremental;
use cluster::linear::SgdClassifier;
use prettytable::{row, Table};

/// 增量训练演示：按块喂入数据，观察验证集上的学习曲线
fn main() -> Result<()> {
    println!("=== 增量训练演示 ===");

    // ---- 1. 生成训练集与验证集 ----
    let (x_train, y_train) = make_classification(4000, 10, 5, 3.0, 23)?;
    let (x_val, y_val) = make_classification(800, 10, 5, 3.0, 24)?;
    println!("训练集: {} 行，验证集: {} 行", x_train.n_rows, x_val.n_rows);

    // ---- 2. 分块 ----
    let chunked = ChunkedMatrix::from_dense(x_train, 500)?;

    // ---- 3. 增量训练 ----
    let mut classifier = SgdClassifier::new();
    classifier.set_learning_rate(0.5);
    let mut incremental = Incremental::new(classifier, vec![0.0, 1.0]);
    incremental
        .fit(&chunked, &y_train, Some((&x_val, &y_val)))
        .context("增量训练失败")?;

    // ---- 4. 打印学习曲线 ----
    let mut table = Table::new();
    table.add_row(row!["已处理块数", "验证集准确率"]);
    for (block, score) in incremental.score_history().iter().enumerate() {
        table.add_row(row![block + 1, format!("{:.4}", score)]);
    }
    table.printstd();

    let final_score = incremental.score(&x_val, &y_val)?;
    println!("最终验证集准确率: {:.4}", final_score);
    Ok(())
}
