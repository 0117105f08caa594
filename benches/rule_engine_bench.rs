use criterion::{black_box, criterion_group, criterion_main, Criterion};
use remark::parser::parse_script;
use remark::script::{execute_script, RemarkInput};
use remark::wrapper::{WrapConfig, WrapMode};

const DOCKER_PS_SCRIPT: &str = r#"
    style "container" { prepend "[" append "]" }
    style "status" { prepend "(" append ")" }
    "^[a-f0-9]{12}" container
    "(Up|Exited|Created)[^\n]*" status
"#;

const DOCKER_PS_LINE: &str =
    "1234567890ab  nginx:latest  \"nginx -g daemon off\"  3 days ago  Up 2 hours  0.0.0.0:80->80/tcp  web_1";

const SUBST_SCRIPT: &str = r#" "\d+" subst "[$0]" "#;
const SUBST_LINE: &str = "request 12345 took 678 ms, retried 9 times, status 200";

fn bench_identity(c: &mut Criterion) {
    let dir = std::env::temp_dir();
    let script = parse_script("", "bench-identity", dir).unwrap();
    let mut input = RemarkInput::new();
    let config = WrapConfig { width: 80, retain: 0, mode: WrapMode::None, prepend: Vec::new(), append: Vec::new() };

    c.bench_function("identity_line", |b| {
        b.iter(|| {
            input.load_line(black_box(DOCKER_PS_LINE.as_bytes()), b"", b"");
            let mut out = Vec::new();
            execute_script(&script, &mut input, &config, &mut out);
            out
        });
    });
}

fn bench_docker_ps_styles(c: &mut Criterion) {
    let dir = std::env::temp_dir();
    let script = parse_script(DOCKER_PS_SCRIPT, "bench-docker-ps.rmk", dir).unwrap();
    let mut input = RemarkInput::new();
    let config = WrapConfig { width: 80, retain: 0, mode: WrapMode::None, prepend: Vec::new(), append: Vec::new() };

    c.bench_function("docker_ps_two_styles", |b| {
        b.iter(|| {
            input.load_line(black_box(DOCKER_PS_LINE.as_bytes()), b"", b"");
            let mut out = Vec::new();
            execute_script(&script, &mut input, &config, &mut out);
            out
        });
    });
}

fn bench_global_substitution(c: &mut Criterion) {
    let dir = std::env::temp_dir();
    let script = parse_script(SUBST_SCRIPT, "bench-subst.rmk", dir).unwrap();
    let mut input = RemarkInput::new();
    let config = WrapConfig { width: 80, retain: 0, mode: WrapMode::None, prepend: Vec::new(), append: Vec::new() };

    c.bench_function("global_number_substitution", |b| {
        b.iter(|| {
            input.load_line(black_box(SUBST_LINE.as_bytes()), b"", b"");
            let mut out = Vec::new();
            execute_script(&script, &mut input, &config, &mut out);
            out
        });
    });
}

fn bench_word_wrap(c: &mut Criterion) {
    let dir = std::env::temp_dir();
    let script = parse_script(DOCKER_PS_SCRIPT, "bench-wrap.rmk", dir).unwrap();
    let mut input = RemarkInput::new();
    let config = WrapConfig { width: 24, retain: 2, mode: WrapMode::Word, prepend: b"> ".to_vec(), append: Vec::new() };

    c.bench_function("docker_ps_word_wrap_width_24", |b| {
        b.iter(|| {
            input.load_line(black_box(DOCKER_PS_LINE.as_bytes()), b"", b"");
            let mut out = Vec::new();
            execute_script(&script, &mut input, &config, &mut out);
            out
        });
    });
}

criterion_group!(benches, bench_identity, bench_docker_ps_styles, bench_global_substitution, bench_word_wrap);
criterion_main!(benches);
