//! Pipeline laws and how pipelines wrap action invocation

use futures::executor::block_on;
use proptest::prelude::*;
use roof_core::{
    create_model, global_middleware, Action, Control, Error, Middleware, ModelDescription,
    PipelineContext, Stage, Value,
};
use std::cell::RefCell;
use std::rc::Rc;

fn add(n: i64) -> Stage {
    Stage::new(move |ctx: &PipelineContext| Ok(Value::Int(ctx.payload.as_int().unwrap_or(0) + n)))
}

fn echo_model(middleware: Option<Middleware>) -> roof_core::ResolvedModel {
    let mut description = ModelDescription::new("echo").with_action(
        "echo",
        Action::new(|_, payload: Value| Ok(payload)),
    );
    if let Some(middleware) = middleware {
        description = description.with_middleware(middleware);
    }
    create_model(description).unwrap()
}

proptest! {
    #[test]
    fn empty_pipeline_is_identity(start in any::<i64>()) {
        let middleware = Middleware::new();
        let result = block_on(middleware.compose(PipelineContext::new("any", start))).unwrap();
        prop_assert_eq!(result, Value::Int(start));
    }

    #[test]
    fn increments_accumulate(n in 0usize..16) {
        let middleware = Middleware::new();
        let step = add(1);
        for _ in 0..n {
            middleware.add(&step);
        }
        let result = block_on(middleware.compose(PipelineContext::new("count", 0i64))).unwrap();
        prop_assert_eq!(result, Value::Int(n as i64));
    }

    #[test]
    fn end_truncates_at_threshold(n in 1usize..16, k in 1i64..16) {
        let middleware = Middleware::new();
        let step = add(1);
        for _ in 0..n {
            middleware.add(&step);
        }
        let result = block_on(middleware.compose_with(PipelineContext::new("count", 0i64), move |ctx| {
            (ctx.payload == Value::Int(k)).then_some(Control::End)
        }))
        .unwrap();
        prop_assert_eq!(result, Value::Int(k.min(n as i64)));
    }

    #[test]
    fn cancel_restores_initial(n in 1usize..16, start in -100i64..100) {
        let middleware = Middleware::new();
        let step = add(1);
        for _ in 0..n {
            middleware.add(&step);
        }
        let result = block_on(middleware.compose_with(PipelineContext::new("count", start), |_| {
            Some(Control::Cancel)
        }))
        .unwrap();
        prop_assert_eq!(result, Value::Int(start));
    }
}

#[test]
fn test_global_then_local_order() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let record = |label: &'static str, order: &Rc<RefCell<Vec<&'static str>>>| {
        let order = Rc::clone(order);
        Stage::new(move |ctx: &PipelineContext| {
            order.borrow_mut().push(label);
            Ok(ctx.payload.clone())
        })
    };

    let local = Middleware::new();
    local.add(record("local", &order));
    global_middleware().add(record("global", &order));

    let echo = echo_model(Some(local)).instantiate().unwrap();
    block_on(echo.dispatch("echo", 1i64)).unwrap();
    assert_eq!(*order.borrow(), ["global", "local"]);
}

#[test]
fn test_pipelines_transform_the_argument() {
    global_middleware().add(add(10));
    let local = Middleware::new();
    local.add(add(1));

    let echo = echo_model(Some(local)).instantiate().unwrap();
    assert_eq!(block_on(echo.dispatch("echo", 0i64)).unwrap(), Value::Int(11));
}

#[test]
fn test_global_cancel_skips_local_and_runs_action() {
    let local_ran = Rc::new(RefCell::new(false));
    global_middleware().add(add(10));
    global_middleware().add(Stage::new(|_: &PipelineContext| Ok(Control::Cancel)));
    let local = Middleware::new();
    local.add(Stage::new({
        let local_ran = Rc::clone(&local_ran);
        move |ctx: &PipelineContext| {
            *local_ran.borrow_mut() = true;
            Ok(ctx.payload.clone())
        }
    }));

    let echo = echo_model(Some(local)).instantiate().unwrap();
    assert_eq!(block_on(echo.dispatch("echo", 5i64)).unwrap(), Value::Int(5));
    assert!(!*local_ran.borrow());
}

#[test]
fn test_local_cancel_uses_original_argument() {
    global_middleware().add(add(10));
    let local = Middleware::new();
    local.add(add(1));
    local.add(Stage::new(|_: &PipelineContext| Ok(Control::Cancel)));

    let echo = echo_model(Some(local)).instantiate().unwrap();
    assert_eq!(block_on(echo.dispatch("echo", 5i64)).unwrap(), Value::Int(5));
}

#[test]
fn test_end_keeps_payload() {
    let local = Middleware::new();
    local.add(add(1));
    local.add(Stage::new(|_: &PipelineContext| Ok(Control::End)));
    local.add(add(100));

    let echo = echo_model(Some(local)).instantiate().unwrap();
    assert_eq!(block_on(echo.dispatch("echo", 0i64)).unwrap(), Value::Int(1));
}

#[test]
fn test_stage_error_skips_action() {
    let error = Error::msg("denied");
    let ran = Rc::new(RefCell::new(false));
    let local = Middleware::new();
    local.add(Stage::new({
        let error = error.clone();
        move |_: &PipelineContext| -> roof_core::Result<Value> { Err(error.clone()) }
    }));

    let model = create_model(
        ModelDescription::new("guarded")
            .with_middleware(local)
            .with_action("run", {
                let ran = Rc::clone(&ran);
                Action::new(move |_, _| {
                    *ran.borrow_mut() = true;
                    Ok(Value::Null)
                })
            }),
    )
    .unwrap();

    let err = block_on(model.instantiate().unwrap().dispatch("run", Value::Null)).unwrap_err();
    assert!(err.same_as(&error));
    assert!(!*ran.borrow());
}

#[test]
fn test_stage_sees_action_name() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    global_middleware().add(Stage::new({
        let seen = Rc::clone(&seen);
        move |ctx: &PipelineContext| {
            seen.borrow_mut().push(ctx.action.clone());
            Ok(ctx.payload.clone())
        }
    }));

    let echo = echo_model(None).instantiate().unwrap();
    block_on(echo.dispatch("echo", Value::Null)).unwrap();
    assert_eq!(*seen.borrow(), ["echo"]);
}
