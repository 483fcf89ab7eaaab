use bencher::{BindCase, Payload};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use micro_intake::validate::{Checks, Validate, ValidationErrors};
use micro_intake::{BindTarget, Body, Intake, Model, Registry, Request};
use serde::Deserialize;
use std::hint::black_box;
use std::sync::Arc;

static SMALL_JSON: Payload = Payload::json(include_str!("../resources/body/user_small.json"));
static LARGE_JSON: Payload = Payload::json(include_str!("../resources/body/user_large.json"));
static SMALL_FORM: Payload = Payload::form(include_str!("../resources/body/user_small.form"));
static LARGE_FORM: Payload = Payload::form(include_str!("../resources/body/user_large.form"));

#[derive(Debug, Default, Deserialize)]
struct User {
    name: String,
    age: u8,
    email: String,
}

impl Validate for User {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Checks::for_struct("User")
            .required("Name", self.name.as_str())
            .lte("Age", self.age, 150)
            .email("Email", &self.email)
            .finish()
    }
}

impl Model for User {}

fn create_cases() -> Vec<BindCase> {
    vec![
        BindCase::small("small_json", SMALL_JSON),
        BindCase::large("large_json", LARGE_JSON),
        BindCase::small("small_form", SMALL_FORM),
        BindCase::large("large_form", LARGE_FORM),
    ]
}

fn request(payload: &Payload) -> Request {
    http::Request::post("/user?source=bench")
        .header(http::header::CONTENT_TYPE, payload.content_type())
        .body(Body::from(payload.body()))
        .expect("bench request should be valid")
}

fn benchmark_bind(criterion: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread().build().expect("runtime should start");
    let intake = Intake::new(Arc::new(Registry::new()));
    let target = BindTarget::of::<User>();
    let mut group = criterion.benchmark_group("bind");

    for case in create_cases() {
        group.throughput(Throughput::Bytes(case.payload().body().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &case, |b, case| {
            b.to_async(&runtime).iter_batched(
                || request(case.payload()),
                |mut req| {
                    let intake = &intake;
                    let target = &target;
                    async move {
                        let result = intake.bind(&mut req, target).await;
                        assert!(result.is_ok(), "bench input should bind");
                        black_box(result);
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(intake, benchmark_bind);
criterion_main!(intake);
