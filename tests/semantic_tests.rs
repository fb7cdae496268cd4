use adcluster::cluster::cluster_semantic;
use adcluster::keyword::{Keyword, KeywordRecord};

fn kw(text: &str) -> Keyword {
    Keyword::from_record(&KeywordRecord::new(text)).unwrap()
}

/// Unit vector at `angle` radians — cosine similarity between two of these
/// is the cosine of the angle between them.
fn unit(angle: f64) -> Vec<f32> {
    vec![angle.cos() as f32, angle.sin() as f32]
}

#[test]
fn identical_embeddings_share_a_cluster() {
    let v = vec![0.6_f32, 0.8];
    let items = vec![(kw("netflix login"), v.clone()), (kw("netflix log in"), v)];
    let clusters = cluster_semantic(items, 0.99);
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].members.len(), 2);
}

#[test]
fn single_keyword_is_a_singleton_not_an_error() {
    let clusters = cluster_semantic(vec![(kw("apple watch"), unit(0.0))], 0.7);
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].members.len(), 1);
    assert_eq!(clusters[0].accum.count(), 1);
}

#[test]
fn empty_input_yields_no_clusters() {
    assert!(cluster_semantic(vec![], 0.7).is_empty());
}

#[test]
fn similarity_against_threshold_splits_or_joins() {
    // two vectors at cos ≈ 0.95
    let angle = 0.95_f64.acos();
    let items = vec![(kw("buy tickets"), unit(0.0)), (kw("purchase tickets"), unit(angle))];
    let joined = cluster_semantic(items.clone(), 0.7);
    assert_eq!(joined.len(), 1, "0.95 similarity clears τ=0.7");

    let split = cluster_semantic(items, 0.98);
    assert_eq!(split.len(), 2, "0.95 similarity fails τ=0.98");
    assert!(split.iter().all(|c| c.members.len() == 1));
}

#[test]
fn raising_threshold_never_reduces_cluster_count() {
    let items: Vec<_> = [0.0, 0.1, 0.2, 0.8, 0.9, 2.0, 2.05]
        .iter()
        .enumerate()
        .map(|(i, &a)| (kw(&format!("keyword number {i}")), unit(a)))
        .collect();
    let mut previous = 0;
    for tau in [0.30, 0.55, 0.70, 0.85, 0.95, 0.99] {
        let count = cluster_semantic(items.clone(), tau).len();
        assert!(
            count >= previous,
            "τ={tau} produced {count} clusters, fewer than {previous} at a lower τ"
        );
        previous = count;
    }
}

#[test]
fn centroid_tracks_running_mean() {
    let items = vec![
        (kw("alpha"), vec![1.0_f32, 0.0]),
        (kw("beta"), vec![0.8_f32, 0.2]),
    ];
    let clusters = cluster_semantic(items, 0.5);
    assert_eq!(clusters.len(), 1);
    let mean = clusters[0].accum.mean();
    assert!((mean[0] - 0.9).abs() < 1e-6);
    assert!((mean[1] - 0.1).abs() < 1e-6);
}

#[test]
fn first_come_centroid_wins_exact_ties() {
    // third vector exactly equidistant from both singleton centroids —
    // joins the earlier one, keeping the pass deterministic
    let diag = std::f32::consts::FRAC_1_SQRT_2;
    let items = vec![
        (kw("left"), vec![1.0_f32, 0.0]),
        (kw("right"), vec![0.0_f32, 1.0]),
        (kw("middle"), vec![diag, diag]),
    ];
    let clusters = cluster_semantic(items, 0.7);
    assert_eq!(clusters.len(), 2);
    let first: Vec<&str> = clusters[0].members.iter().map(|(k, _)| k.text.as_str()).collect();
    assert_eq!(first, vec!["left", "middle"]);
}

#[test]
fn zero_vector_forms_its_own_cluster() {
    // cosine against a zero vector is defined as 0.0, below any τ
    let items = vec![
        (kw("normal"), unit(0.0)),
        (kw("broken"), vec![0.0_f32, 0.0]),
    ];
    let clusters = cluster_semantic(items, 0.3);
    assert_eq!(clusters.len(), 2);
}
