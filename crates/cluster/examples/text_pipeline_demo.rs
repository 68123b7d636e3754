use cluster::datasets::{builtin_corpus, load_text_corpus};
use cluster::error::Result;
use cluster::linear::SgdClassifier;
use cluster::pipeline::TextPipeline;
use cluster::vectorizer::HashingVectorizer;

/// 文本分类流水线演示：哈希向量化 + SGD 分类器
fn main() -> Result<()> {
    println!("=== 文本分类流水线演示 ===");

    // ---- 1. 加载语料 ----
    // 优先使用本地 corpus/ 目录，不存在时退回内置小语料
    let corpus = match load_text_corpus("corpus") {
        Ok(corpus) => corpus,
        Err(_) => {
            println!("未找到 corpus/ 目录，使用内置语料");
            builtin_corpus()
        }
    };
    println!("类别: {:?}，文档数: {}", corpus.target_names, corpus.len());

    // ---- 2. 构建并训练流水线 ----
    let mut classifier = SgdClassifier::new();
    classifier.set_learning_rate(0.5);
    classifier.set_n_epochs(30);
    let mut pipeline = TextPipeline::new(HashingVectorizer::new(512), classifier);
    pipeline.fit(&corpus.data, &corpus.target)?;

    let accuracy = pipeline.score(&corpus.data, &corpus.target)?;
    println!("训练集准确率: {:.4}", accuracy);

    // ---- 3. 预测新文档 ----
    let fresh_docs = vec![
        "the cooling fan on my video card died again".to_string(),
        "he struck out the side in the ninth inning".to_string(),
    ];
    let predictions = pipeline.predict(&fresh_docs)?;
    for (doc, label) in fresh_docs.iter().zip(predictions.iter()) {
        let category = &corpus.target_names[*label as usize];
        println!("[{}] {}", category, doc);
    }
    Ok(())
}
