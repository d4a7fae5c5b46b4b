//! End-to-end properties of the iq pipeline.

use pretty_assertions::assert_eq;

use iq::{
    canonical, process, tokens_from_program, Colour, IqError, PixelBuffer, DEFAULT_CANVAS_SIZE,
};

/// A small gradient image with varied channels and some transparency.
fn sample_image() -> PixelBuffer {
    PixelBuffer::from_fn(16, 12, |x, y| {
        let a = if (x + y) % 7 == 0 { 0 } else { 255 };
        Colour::new((x * 16) as u8, (y * 21) as u8, ((x * y) % 256) as u8, a)
    })
}

#[test]
fn process_is_deterministic() {
    let image = sample_image();
    let program = "blend(input, invert(input), 0.3) as soft opacity 0.8 mode screen; grey(input) z -1";

    let first = process(&image, program).unwrap();
    let second = process(&image, program).unwrap();
    assert_eq!(first, second);
}

#[test]
fn identity_program_returns_input_exactly() {
    let image = sample_image();
    let out = process(&image, "input").unwrap();
    assert_eq!(out, image);
}

#[test]
fn scalar_program_yields_default_canvas() {
    let image = sample_image();
    let out = process(&image, "1 + 1").unwrap();

    assert_eq!(out.size(), (DEFAULT_CANVAS_SIZE, DEFAULT_CANVAS_SIZE));
    assert_eq!(out.get(0, 0), Some(Colour::WHITE));
    assert_eq!(
        out.get(DEFAULT_CANVAS_SIZE - 1, DEFAULT_CANVAS_SIZE - 1),
        Some(Colour::WHITE)
    );
}

#[test]
fn opaque_top_layer_wins() {
    let image = sample_image();

    // The fully opaque normal top layer is the whole result.
    let out = process(&image, "grey(input); invert(input)").unwrap();
    let expected = process(&image, "invert(input)").unwrap();
    assert_eq!(out, expected);
}

#[test]
fn transparent_top_layer_is_invisible() {
    let image = sample_image();

    let out = process(&image, "grey(input); invert(input) opacity 0").unwrap();
    let expected = process(&image, "grey(input)").unwrap();
    assert_eq!(out, expected);
}

#[test]
fn z_order_overrides_statement_order() {
    let image = sample_image();

    // fill(#f00) is evaluated first but z puts it on top.
    let out = process(&image, "fill(#f00) z 10; input").unwrap();
    assert_eq!(out, process(&image, "input; fill(#f00)").unwrap());
}

#[test]
fn undefined_identifier_is_an_eval_error_naming_it() {
    let image = sample_image();
    match process(&image, "shadow * 0.5").unwrap_err() {
        IqError::Eval { message, .. } => assert!(message.contains("'shadow'")),
        other => panic!("expected eval error, got {:?}", other),
    }
}

#[test]
fn mismatched_layer_sizes_fail_at_compositing() {
    let image = sample_image();
    match process(&image, "input; crop(input, 0, 0, 4, 4)").unwrap_err() {
        IqError::DimensionMismatch {
            width,
            height,
            other_width,
            other_height,
            ..
        } => {
            assert_eq!((width, height), (16, 12));
            assert_eq!((other_width, other_height), (4, 4));
        }
        other => panic!("expected dimension mismatch, got {:?}", other),
    }
}

#[test]
fn empty_program_is_a_parse_error() {
    let image = sample_image();
    assert!(matches!(
        process(&image, "").unwrap_err(),
        IqError::Parse { .. }
    ));
    assert!(matches!(
        process(&image, "  \n ").unwrap_err(),
        IqError::Parse { .. }
    ));
}

#[test]
fn token_round_trip_is_canonical() {
    let source = "blend(input,invert(input),0.5)as mix opacity 0.8;grey(input)z -1";
    let tokens = tokens_from_program(source).unwrap();
    let canon = canonical(&tokens);

    // The canonical form is stable under re-tokenization.
    let again = tokens_from_program(&canon).unwrap();
    assert_eq!(canonical(&again), canon);

    // And both token sequences agree kind-for-kind.
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
    let kinds_again: Vec<_> = again.iter().map(|t| t.kind.clone()).collect();
    assert_eq!(kinds, kinds_again);
}

#[test]
fn canonical_program_still_runs_identically() {
    let image = sample_image();
    let source = "blend(input,invert(input),0.25)as soft;grey(input)opacity 0.5 mode multiply";
    let canon = canonical(&tokens_from_program(source).unwrap());

    assert_eq!(
        process(&image, source).unwrap(),
        process(&image, &canon).unwrap()
    );
}

#[test]
fn layers_compose_with_arithmetic_and_references() {
    let image = sample_image();

    // A brightened copy referenced by name in a later statement.
    let out = process(&image, "input * 1.5 as bright; bright - input as diff").unwrap();
    assert_eq!(out.size(), image.size());

    // The top layer is (bright - input): spot-check one opaque pixel.
    let x = 3;
    let y = 2;
    let base = image.get(x, y).unwrap();
    let bright = (base.r as f64 * 1.5).round().min(255.0) as u8;
    let expected_r = bright.saturating_sub(base.r);
    assert_eq!(out.get(x, y).unwrap().r, expected_r);
}

#[test]
fn lex_error_reports_offset() {
    let image = sample_image();
    match process(&image, "input £ 2").unwrap_err() {
        IqError::Lex { character, offset } => {
            assert_eq!(character, '£');
            assert_eq!(offset, 6);
        }
        other => panic!("expected lex error, got {:?}", other),
    }
}

#[test]
fn division_by_zero_is_an_eval_error() {
    let image = sample_image();
    assert!(matches!(
        process(&image, "input / 0").unwrap_err(),
        IqError::Eval { .. }
    ));
}

#[test]
fn type_mismatch_is_reported_with_operator() {
    let image = sample_image();
    match process(&image, "#fff / input").unwrap_err() {
        IqError::TypeMismatch { operator, operands, .. } => {
            assert_eq!(operator, "/");
            assert!(operands.contains("colour"));
            assert!(operands.contains("image"));
        }
        other => panic!("expected type mismatch, got {:?}", other),
    }
}

#[test]
fn deep_nesting_hits_resource_limit_not_stack() {
    let image = sample_image();
    let program = format!("{}input{}", "(".repeat(500), ")".repeat(500));
    assert!(matches!(
        process(&image, &program).unwrap_err(),
        IqError::ResourceLimit { .. }
    ));
}

#[test]
fn masked_blend_preserves_dimensions_and_alpha_rules() {
    let image = sample_image();
    let out = process(&image, "mask(input, grey(input))").unwrap();
    assert_eq!(out.size(), image.size());

    // A pixel whose mask luma is 0 becomes fully transparent in the layer;
    // compositing at full opacity then keeps that transparent sample.
    let black_mask = process(&image, "mask(input, fill(#000))").unwrap();
    assert!(black_mask.rows().iter().flatten().all(|c| c.a == 0));
}
