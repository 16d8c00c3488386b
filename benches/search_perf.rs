use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use hri::model::{Candidate, Education, WorkExperience};
use hri::search::fuzzy::similarity;
use hri::search::{Embedder, HashEmbedder, SearchQuery};
use hri::test_utils::fixtures::MemoryStore;

const SKILLS: &[&str] = &[
    "Python", "Rust", "Go", "Kubernetes", "Terraform", "PostgreSQL", "React", "Java", "Kafka",
    "AWS",
];
const COMPANIES: &[&str] = &["Acme Inc.", "Globex", "Initech", "Umbrella Corp", "Hooli"];
const ROLES: &[&str] = &[
    "Backend Engineer",
    "Data Engineer",
    "Platform Engineer",
    "Product Designer",
    "Site Reliability Engineer",
];

fn synthetic(n: usize) -> Vec<Candidate> {
    (0..n)
        .map(|i| {
            Candidate::new(format!("c-{i:05}"), format!("Candidate {i}"))
                .expect("valid candidate")
                .with_skills((0..3).map(|k| SKILLS[(i + k * 3) % SKILLS.len()]))
                .with_experience(
                    WorkExperience::new(COMPANIES[i % COMPANIES.len()], ROLES[i % ROLES.len()])
                        .with_responsibility(format!(
                            "owned {} services handling cloud infrastructure workloads",
                            SKILLS[i % SKILLS.len()]
                        )),
                )
                .with_education(Education::new("State University", "BSc Computer Science"))
                .validate()
                .expect("valid candidate")
        })
        .collect()
}

fn bench_embedding(c: &mut Criterion) {
    let embedder = HashEmbedder::default();
    let text = "Site Reliability Engineer at Acme: ran cloud infrastructure, on-call lead";
    c.bench_function("hash_embed_sentence", |b| {
        b.iter(|| embedder.embed(black_box(text)));
    });
}

fn bench_fuzzy(c: &mut Criterion) {
    c.bench_function("fuzzy_similarity", |b| {
        b.iter(|| similarity(black_box("senior platform engineer"), black_box("Platform Engineer II")));
    });
}

fn bench_hybrid(c: &mut Criterion) {
    let store = MemoryStore::with_candidates(&synthetic(500));
    let query = SearchQuery::new()
        .with_text("cloud infrastructure")
        .with_skills(["kubernetes", "python"])
        .with_roles(["platform engineer"])
        .with_limit(10);
    c.bench_function("hybrid_search_500", |b| {
        b.iter(|| store.search.search(black_box(&query)).expect("search"));
    });

    let skills_only = SearchQuery::new().with_skills(["rust"]).match_all_skills(true);
    c.bench_function("skill_filter_500", |b| {
        b.iter(|| store.search.search(black_box(&skills_only)).expect("search"));
    });
}

criterion_group!(benches, bench_embedding, bench_fuzzy, bench_hybrid);
criterion_main!(benches);
