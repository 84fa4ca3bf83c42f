use criterion::{black_box, criterion_group, criterion_main, Criterion};
use group_ledger::reconcile::reconcile;
use group_ledger::reconcile::summary::{ParticipantNames, SummaryRenderer};
use group_ledger::simulation::generator::{generate_random_chat, ChatConfig};

fn bench_reconcile(c: &mut Criterion, participants: usize, expenses: usize, debts: usize) {
    let config = ChatConfig {
        participant_count: participants,
        expense_count: expenses,
        debt_count: debts,
        ..Default::default()
    };
    let chat = generate_random_chat(&config);

    c.bench_function(&format!("reconcile_{}_participants", participants), |b| {
        b.iter(|| reconcile(black_box(&chat.expenses), black_box(&chat.debts)))
    });
}

fn bench_reconcile_10_participants(c: &mut Criterion) {
    bench_reconcile(c, 10, 50, 10);
}

fn bench_reconcile_100_participants(c: &mut Criterion) {
    bench_reconcile(c, 100, 1_000, 200);
}

fn bench_reconcile_1000_participants(c: &mut Criterion) {
    bench_reconcile(c, 1_000, 10_000, 2_000);
}

fn bench_render_summary(c: &mut Criterion) {
    let config = ChatConfig {
        participant_count: 20,
        expense_count: 200,
        debt_count: 40,
        ..Default::default()
    };
    let chat = generate_random_chat(&config);
    let mut names = ParticipantNames::new();
    for participant in &chat.participants {
        names.insert(participant.id, participant.name.clone());
    }
    let (view, plan) = reconcile(&chat.expenses, &chat.debts);
    let renderer = SummaryRenderer::new(&names);

    c.bench_function("render_summary_20_participants", |b| {
        b.iter(|| renderer.render(black_box(&view), black_box(&plan)))
    });
}

criterion_group!(
    benches,
    bench_reconcile_10_participants,
    bench_reconcile_100_participants,
    bench_reconcile_1000_participants,
    bench_render_summary
);
criterion_main!(benches);
