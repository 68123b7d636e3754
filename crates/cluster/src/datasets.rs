// datasets.rs
// 数据集模块，提供合成数据生成器与文本语料加载器。
use crate::error::{Error, Result};
use crate::types::DenseMatrix;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::Path;

/// 标准正态分布采样（Box-Muller 变换）
fn sample_gauss(rng: &mut StdRng) -> f32 {
    let u1: f32 = rng.gen_range(f32::EPSILON..1.0);
    let u2: f32 = rng.gen::<f32>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
}

/// 生成各向同性高斯团块数据集。
/// 返回 (特征矩阵, 团块标签)，标签为团块编号。
pub fn make_blobs(
    n_samples: usize,
    n_features: usize,
    n_centers: usize,
    cluster_std: f32,
    seed: u64,
) -> Result<(DenseMatrix, Vec<f32>)> {
    if n_samples == 0 || n_features == 0 || n_centers == 0 {
        return Err(Error::DataError("样本数、特征数和中心数必须大于0".to_string()));
    }
    let mut rng = StdRng::seed_from_u64(seed);

    // 在 [-10, 10] 范围内均匀采样团块中心
    let centers: Vec<Vec<f32>> = (0..n_centers)
        .map(|_| (0..n_features).map(|_| rng.gen_range(-10.0..10.0)).collect())
        .collect();

    let mut data = Vec::with_capacity(n_samples * n_features);
    let mut target = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let center_id = i % n_centers;
        for d in 0..n_features {
            data.push(centers[center_id][d] + sample_gauss(&mut rng) * cluster_std);
        }
        target.push(center_id as f32);
    }

    let matrix = DenseMatrix::new(data, n_samples, n_features)?;
    Ok((matrix, target))
}

/// 生成二分类合成数据集。
/// 前 n_informative 个特征按类别中心分离，其余特征为纯噪声，样本顺序已打乱。
pub fn make_classification(
    n_samples: usize,
    n_features: usize,
    n_informative: usize,
    class_sep: f32,
    seed: u64,
) -> Result<(DenseMatrix, Vec<f32>)> {
    if n_samples == 0 || n_features == 0 {
        return Err(Error::DataError("样本数和特征数必须大于0".to_string()));
    }
    if n_informative == 0 || n_informative > n_features {
        return Err(Error::DataError(format!(
            "有效特征数 {} 超出范围 [1, {}]",
            n_informative, n_features
        )));
    }
    let mut rng = StdRng::seed_from_u64(seed);

    let mut rows: Vec<(Vec<f32>, f32)> = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let label = (i % 2) as f32;
        let offset = if label > 0.5 { class_sep / 2.0 } else { -class_sep / 2.0 };
        let mut row = Vec::with_capacity(n_features);
        for d in 0..n_features {
            if d < n_informative {
                row.push(offset + sample_gauss(&mut rng));
            } else {
                row.push(sample_gauss(&mut rng));
            }
        }
        rows.push((row, label));
    }
    rows.shuffle(&mut rng);

    let mut data = Vec::with_capacity(n_samples * n_features);
    let mut target = Vec::with_capacity(n_samples);
    for (row, label) in rows {
        data.extend_from_slice(&row);
        target.push(label);
    }

    let matrix = DenseMatrix::new(data, n_samples, n_features)?;
    Ok((matrix, target))
}

/// 文本语料，包含文档内容、类别标签和类别名
#[derive(Debug, Clone)]
pub struct TextCorpus {
    /// 文档内容
    pub data: Vec<String>,
    /// 每篇文档的类别标签（类别编号）
    pub target: Vec<f32>,
    /// 类别名列表，下标即类别编号
    pub target_names: Vec<String>,
}

impl TextCorpus {
    /// 文档数
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// 校验语料目录结构：要求至少两个类别子目录，每个子目录至少一个 .txt 文件
pub fn verify_corpus_dir<P: AsRef<Path>>(dir: P) -> Result<bool> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(Error::DataError(format!("语料目录 {} 不存在", dir.display())));
    }

    let mut n_categories = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let n_docs = fs::read_dir(&path)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "txt"))
            .count();
        if n_docs == 0 {
            return Err(Error::DataError(format!(
                "类别目录 {} 中没有 .txt 文档",
                path.display()
            )));
        }
        n_categories += 1;
    }

    if n_categories < 2 {
        return Err(Error::DataError(format!(
            "语料目录 {} 中类别数 {} 不足，至少需要2个类别",
            dir.display(),
            n_categories
        )));
    }
    Ok(true)
}

/// 从目录加载文本语料。
/// 目录结构：每个子目录为一个类别，子目录下每个 .txt 文件为一篇文档。
pub fn load_text_corpus<P: AsRef<Path>>(dir: P) -> Result<TextCorpus> {
    let dir = dir.as_ref();
    verify_corpus_dir(dir)?;

    // 子目录按名称排序，保证类别编号稳定
    let mut category_dirs: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    category_dirs.sort();

    let mut data = Vec::new();
    let mut target = Vec::new();
    let mut target_names = Vec::new();
    for (category_id, category_dir) in category_dirs.iter().enumerate() {
        let name = category_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| Error::DataError("无法解析类别目录名".to_string()))?;

        let mut doc_paths: Vec<_> = fs::read_dir(category_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map_or(false, |ext| ext == "txt"))
            .collect();
        doc_paths.sort();

        for doc_path in doc_paths {
            let contents = fs::read_to_string(&doc_path)?;
            data.push(contents);
            target.push(category_id as f32);
        }
        target_names.push(name);
    }

    println!(
        "语料加载完成: {} 个类别，共 {} 篇文档",
        target_names.len(),
        data.len()
    );
    Ok(TextCorpus {
        data,
        target,
        target_names,
    })
}

// 内置小语料：两个类别各8篇短文档，保证演示程序离线可运行
const BUILTIN_HARDWARE_DOCS: &[&str] = &[
    "the new graphics card needs a bigger power supply and better cooling",
    "my motherboard refuses to boot after the bios firmware update",
    "upgraded the cpu and added more memory, compile times dropped a lot",
    "the disk controller keeps resetting under heavy io load",
    "looking for a cheap video card that can drive two monitors",
    "the fan on this gpu is way too loud under full load",
    "swapped the power supply and the random crashes finally stopped",
    "benchmark results for the new chipset look impressive so far",
];

const BUILTIN_BASEBALL_DOCS: &[&str] = &[
    "the pitcher threw a complete game shutout last night",
    "our team needs a better bullpen before the playoffs",
    "he hit two home runs and a double in the same game",
    "the shortstop made an incredible diving catch in the ninth inning",
    "season batting average above three hundred is impressive",
    "the manager argued the call at home plate and got ejected",
    "they traded their best outfielder for two pitching prospects",
    "extra innings again, the bullpen must be exhausted",
];

/// 返回内置的双类别小语料
pub fn builtin_corpus() -> TextCorpus {
    let mut data = Vec::new();
    let mut target = Vec::new();
    for doc in BUILTIN_HARDWARE_DOCS {
        data.push(doc.to_string());
        target.push(0.0);
    }
    for doc in BUILTIN_BASEBALL_DOCS {
        data.push(doc.to_string());
        target.push(1.0);
    }
    TextCorpus {
        data,
        target,
        target_names: vec!["hardware".to_string(), "baseball".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_make_blobs_shape_and_labels() {
        let (matrix, target) = make_blobs(90, 4, 3, 0.5, 7).unwrap();
        assert_eq!(matrix.shape(), (90, 4));
        assert_eq!(target.len(), 90);
        for label in &target {
            assert!(*label >= 0.0 && *label <= 2.0);
        }
    }

    #[test]
    fn test_make_blobs_deterministic() {
        let (a, _) = make_blobs(50, 3, 2, 1.0, 42).unwrap();
        let (b, _) = make_blobs(50, 3, 2, 1.0, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_make_classification_labels_balanced() {
        let (matrix, target) = make_classification(100, 6, 3, 2.0, 11).unwrap();
        assert_eq!(matrix.shape(), (100, 6));
        let positives = target.iter().filter(|&&y| y > 0.5).count();
        assert_eq!(positives, 50);
    }

    #[test]
    fn test_make_classification_rejects_bad_params() {
        assert!(make_classification(10, 4, 0, 1.0, 0).is_err());
        assert!(make_classification(10, 4, 5, 1.0, 0).is_err());
    }

    #[test]
    fn test_builtin_corpus() {
        let corpus = builtin_corpus();
        assert_eq!(corpus.len(), 16);
        assert_eq!(corpus.target_names.len(), 2);
        assert_eq!(corpus.target.iter().filter(|&&y| y > 0.5).count(), 8);
    }

    #[test]
    fn test_load_text_corpus_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        for (category, docs) in [("alpha", 3usize), ("beta", 2usize)] {
            let cat_dir = dir.path().join(category);
            fs::create_dir(&cat_dir).unwrap();
            for i in 0..docs {
                let mut file = fs::File::create(cat_dir.join(format!("doc_{}.txt", i))).unwrap();
                writeln!(file, "{} 文档 {}", category, i).unwrap();
            }
        }

        let corpus = load_text_corpus(dir.path()).unwrap();
        assert_eq!(corpus.len(), 5);
        assert_eq!(corpus.target_names, vec!["alpha", "beta"]);
        // alpha 在前，前3篇标签为0
        assert_eq!(corpus.target[..3], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_verify_corpus_dir_rejects_single_category() {
        let dir = tempfile::tempdir().unwrap();
        let cat_dir = dir.path().join("only");
        fs::create_dir(&cat_dir).unwrap();
        fs::write(cat_dir.join("doc.txt"), "lonely").unwrap();
        assert!(verify_corpus_dir(dir.path()).is_err());
    }
}
