use specwright::{FunSuite, Spec, Suite};
use std::sync::atomic::{AtomicU32, Ordering};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    specwright::run(|| {
        // =================================================================
        // Function-style suite
        // =================================================================
        let calculator = FunSuite::new("Calculator");
        calculator.test("adds two numbers", || {
            let (a, b) = (2, 3);
            assert_eq!(a + b, 5);
        })?;
        calculator.tagged_test("multiplies", &["fast"], || {
            assert_eq!(3 * 4, 12);
        })?;
        calculator.test_with_args("reports what it checked", &[], |args| {
            args.info("checked 10 / 2");
            assert_eq!(10 / 2, 5);
        })?;
        calculator.ignore("divides by zero", || {
            panic!("attempt to divide by zero");
        })?;

        // =================================================================
        // Closure-built spec: scopes, shared behaviors, hooks
        // =================================================================
        static BEFORE_ALL: AtomicU32 = AtomicU32::new(0);
        static BEFORE_EACH: AtomicU32 = AtomicU32::new(0);

        let stack = Spec::build("StackSpec", |ctx| {
            ctx.share("a non-empty stack", |ctx| {
                ctx.it("return the top item on peek", || {
                    assert_eq!(vec![1, 2].last(), Some(&2));
                });
            });

            ctx.describe("A Stack", |ctx| {
                ctx.before_all(|| {
                    BEFORE_ALL.fetch_add(1, Ordering::SeqCst);
                });
                ctx.before_each(|| {
                    BEFORE_EACH.fetch_add(1, Ordering::SeqCst);
                });

                ctx.it("pop the last pushed value", || {
                    let mut stack = vec![1, 2];
                    assert_eq!(stack.pop(), Some(2));
                });

                ctx.it("have run before_all exactly once", || {
                    assert_eq!(BEFORE_ALL.load(Ordering::SeqCst), 1);
                    assert_eq!(BEFORE_EACH.load(Ordering::SeqCst), 2);
                });

                ctx.when("full", |ctx| {
                    ctx.it("refuse a push", || {});
                    ctx.behaves_like("a non-empty stack");
                });

                ctx.it("grow once resizing lands", || specwright::pending());
            });
        })?;

        // =================================================================
        // Word DSL
        // =================================================================
        let queue = specwright::spec! {
            suite "QueueSpec";

            describe "A Queue" {
                it "dequeue in insertion order" tags("fast") {
                    let mut queue = std::collections::VecDeque::from([1, 2]);
                    assert_eq!(queue.pop_front(), Some(1));
                }

                xit "persist across restarts" {
                    panic!("not implemented");
                }
            }
        };
        let queue = queue?;

        Ok(vec![
            Box::new(calculator) as Box<dyn Suite>,
            Box::new(stack),
            Box::new(queue),
        ])
    });
}
