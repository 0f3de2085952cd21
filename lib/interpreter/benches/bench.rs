use criterion::{criterion_group, criterion_main, Criterion};
use interpreter::Interpreter;

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("fib loop", |b| b.iter(|| {
        let source = r#"
            var a = 0;
            var b = 1;
            for (var i = 0; i < 50; i = i + 1) {
                var next = a + b;
                a = b;
                b = next;
            }

            print a;
        "#;
        Interpreter::new(Vec::new()).run_source(source).unwrap();
    }));

    c.bench_function("nested scopes and strings", |b| b.iter(|| {
        let source = r#"
            var s = "";
            var i = 0;
            while (i < 20) {
                {
                    var piece = "x";
                    { s = s + piece; }
                }
                i = i + 1;
            }

            print s;
        "#;
        Interpreter::new(Vec::new()).run_source(source).unwrap();
    }));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
