use oxc_allocator::Allocator;
use oxc_parser::Parser;

use crate::interpreter::{Interpreter, Limits};
use crate::transpile::TranspileConfig;

fn eval_with(source: &str, limits: Limits) -> Result<String, String> {
    let allocator = Allocator::default();
    let source_type = TranspileConfig::default().source_type().with_jsx(false);
    let ret = Parser::new(&allocator, source, source_type).parse();
    assert!(ret.errors.is_empty(), "parse errors: {:?}", ret.errors);
    let program = allocator.alloc(ret.program);

    let mut interp = Interpreter::new(limits);
    let result = interp
        .run_program(program)
        .map(|value| value.to_js_string())
        .map_err(|fault| fault.message());
    result
}

fn eval(source: &str) -> Result<String, String> {
    eval_with(source, Limits::default())
}

fn eval_ok(source: &str) -> String {
    match eval(source) {
        Ok(value) => value,
        Err(message) => panic!("unexpected fault: {}", message),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FUNCTIONS & SCOPES
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_closures_keep_their_environment() {
    let out = eval_ok(
        r#"
        function counter() { let n = 0; return () => ++n; }
        const c = counter();
        c(); c();
        c()
        "#,
    );
    assert_eq!(out, "3");
}

#[test]
fn test_function_declarations_are_hoisted() {
    assert_eq!(eval_ok("double(21); function double(n) { return n * 2 }"), "42");
}

#[test]
fn test_default_and_rest_parameters() {
    let out = eval_ok(
        r#"
        const f = (a, b = 10, ...more) => [a, b, more.length].join('-');
        f(1) + '|' + f(1, 2, 3, 4)
        "#,
    );
    assert_eq!(out, "1-10-0|1-2-2");
}

#[test]
fn test_bind_call_apply() {
    let out = eval_ok(
        r#"
        function who(greeting) { return greeting + ' ' + this.name }
        const bob = { name: 'Bob' };
        [who.call(bob, 'hi'), who.apply(bob, ['yo']), who.bind(bob, 'hey')()].join(',')
        "#,
    );
    assert_eq!(out, "hi Bob,yo Bob,hey Bob");
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLASSES & DECORATORS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_class_inheritance_and_super_methods() {
    let out = eval_ok(
        r#"
        class Animal {
          constructor(name) { this.name = name }
          speak() { return this.name + ' makes a sound' }
        }
        class Dog extends Animal {
          speak() { return super.speak() + ' (woof)' }
        }
        new Dog('Rex').speak()
        "#,
    );
    assert_eq!(out, "Rex makes a sound (woof)");
}

#[test]
fn test_class_fields_and_bound_arrow_methods() {
    let out = eval_ok(
        r#"
        class Counter {
          count = 1;
          inc = () => { this.count += 1; return this.count }
        }
        const inc = new Counter().inc;
        inc();
        inc()
        "#,
    );
    assert_eq!(out, "3");
}

#[test]
fn test_static_members() {
    let out = eval_ok(
        r#"
        class Size {
          static base = 2;
          static double() { return Size.base * 2 }
        }
        Size.double()
        "#,
    );
    assert_eq!(out, "4");
}

#[test]
fn test_instanceof_follows_prototype_chain() {
    let out = eval_ok(
        r#"
        class A {}
        class B extends A {}
        const b = new B();
        [b instanceof A, b instanceof B, {} instanceof A].join(',')
        "#,
    );
    assert_eq!(out, "true,true,false");
}

#[test]
fn test_extending_error() {
    let err = eval(
        r#"
        class ValidationError extends Error {
          constructor(field) { super(field + ' is required'); this.field = field }
        }
        throw new ValidationError('title')
        "#,
    )
    .unwrap_err();
    assert_eq!(err, "title is required");
}

#[test]
fn test_class_called_without_new() {
    let err = eval("class Card {} Card()").unwrap_err();
    assert_eq!(err, "Class constructor Card cannot be invoked without 'new'");
}

#[test]
fn test_legacy_method_and_class_decorators() {
    let out = eval_ok(
        r#"
        function shout(target, key, descriptor) {
          const original = descriptor.value;
          descriptor.value = function() { return original.call(this).toUpperCase() };
          return descriptor;
        }
        function tagged(cls) { cls.tagged = true; return cls }

        @tagged
        class Greeter {
          @shout
          greet() { return 'hi ' + this.name }
          name = 'ann';
        }
        `${new Greeter().greet()}-${Greeter.tagged}`
        "#,
    );
    assert_eq!(out, "HI ANN-true");
}

#[test]
fn test_decorators_apply_bottom_up() {
    let out = eval_ok(
        r#"
        const order = [];
        const mark = (label) => (cls) => { order.push(label) };
        @mark('outer')
        @mark('inner')
        class Panel {}
        order.join('>')
        "#,
    );
    assert_eq!(out, "inner>outer");
}

// ═══════════════════════════════════════════════════════════════════════════════
// DESTRUCTURING, SPREAD & OPERATORS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_object_and_array_destructuring() {
    let out = eval_ok(
        r#"
        const { a, b: { c = 5 }, ...rest } = { a: 1, b: {}, d: 4, e: 5 };
        const [x, , y = 10, ...others] = [1, 2, undefined, 4, 5];
        [a, c, rest.d + rest.e, x, y, others.length].join(',')
        "#,
    );
    assert_eq!(out, "1,5,9,1,10,2");
}

#[test]
fn test_destructuring_null_is_a_type_error() {
    let err = eval("const { size } = null").unwrap_err();
    assert!(err.starts_with("Cannot destructure"), "{}", err);
}

#[test]
fn test_spread_in_arrays_objects_and_calls() {
    let out = eval_ok(
        r#"
        const base = { color: 'red', size: 'small' };
        const props = { ...base, size: 'large' };
        const nums = [1, ...[2, 3]];
        [props.color, props.size, Math.max(...nums)].join(' ')
        "#,
    );
    assert_eq!(out, "red large 3");
}

#[test]
fn test_optional_chaining_and_nullish_coalescing() {
    let out = eval_ok(
        r#"
        const o = { a: { b: null } };
        [o?.a?.b?.c, o.x?.y, o.a.b ?? 'fallback', o.missing?.()].map(String).join(',')
        "#,
    );
    assert_eq!(out, "undefined,undefined,fallback,undefined");
}

#[test]
fn test_logical_assignment() {
    let out = eval_ok(
        r#"
        const opts = { size: null, color: 'red' };
        opts.size ??= 'medium';
        opts.color ||= 'blue';
        opts.count = 0;
        opts.count &&= 5;
        [opts.size, opts.color, opts.count].join(',')
        "#,
    );
    assert_eq!(out, "medium,red,0");
}

#[test]
fn test_typeof_undeclared_is_undefined() {
    assert_eq!(eval_ok("typeof notDeclared"), "undefined");
    assert_eq!(eval_ok("typeof (() => 1)"), "function");
}

#[test]
fn test_loose_and_strict_equality() {
    assert_eq!(eval_ok("[1 == '1', 1 === '1', null == undefined, NaN === NaN].join()"), "true,false,true,false");
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONTROL FLOW
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_try_catch_finally_ordering() {
    let out = eval_ok(
        r#"
        const log = [];
        function risky() {
          try { throw new TypeError('bad') }
          catch (e) { log.push(e.name + ':' + e.message); return 'caught' }
          finally { log.push('finally') }
        }
        log.push(risky());
        log.join('|')
        "#,
    );
    assert_eq!(out, "TypeError:bad|finally|caught");
}

#[test]
fn test_switch_fallthrough_and_default() {
    let out = eval_ok(
        r#"
        function kind(n) {
          switch (n) {
            case 1:
            case 2: return 'small';
            case 3: { return 'three' }
            default: return 'big';
          }
        }
        [kind(1), kind(2), kind(3), kind(9)].join(',')
        "#,
    );
    assert_eq!(out, "small,small,three,big");
}

#[test]
fn test_loops_with_continue_and_for_in() {
    let out = eval_ok(
        r#"
        const parts = [];
        for (const n of [1, 2, 3]) { if (n === 2) continue; parts.push(n) }
        for (const k in { p: 1, q: 2 }) parts.push(k);
        let i = 0;
        do { i++ } while (i < 4);
        parts.join('') + i
        "#,
    );
    assert_eq!(out, "13pq4");
}

#[test]
fn test_labeled_break_leaves_outer_loop() {
    let out = eval_ok(
        r#"
        let found = null;
        outer: for (let i = 0; i < 3; i++) {
          for (let j = 0; j < 3; j++) {
            if (i * j === 2) { found = `${i},${j}`; break outer }
          }
        }
        found
        "#,
    );
    assert_eq!(out, "1,2");
}

// ═══════════════════════════════════════════════════════════════════════════════
// INTRINSICS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_array_methods() {
    let out = eval_ok(
        r#"
        const xs = [3, 1, 2];
        const sorted = xs.slice().sort((a, b) => a - b);
        [
          sorted.join(''),
          xs.reduce((sum, n) => sum + n, 0),
          xs.filter(n => n > 1).length,
          xs.find(n => n < 3),
          xs.includes(2),
        ].join(' ')
        "#,
    );
    assert_eq!(out, "123 6 2 1 true");
}

#[test]
fn test_string_methods_and_templates() {
    let out = eval_ok(
        r#"
        const word = '  Segment ';
        `${word.trim().toLowerCase()}:${'a-b-c'.split('-').length}:${'x'.padStart(3, '.')}`
        "#,
    );
    assert_eq!(out, "segment:3:..x");
}

#[test]
fn test_json_stringify() {
    assert_eq!(
        eval_ok("JSON.stringify({ a: [1, 'x'], b: null })"),
        r#"{"a":[1,"x"],"b":null}"#
    );
}

#[test]
fn test_math_random_is_deterministic() {
    let first = eval_ok("[Math.random(), Math.random()].join()");
    let second = eval_ok("[Math.random(), Math.random()].join()");
    assert_eq!(first, second);
}

// ═══════════════════════════════════════════════════════════════════════════════
// ERRORS & LIMITS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_runtime_error_messages() {
    assert_eq!(eval("missing + 1").unwrap_err(), "missing is not defined");
    assert_eq!(eval("const o = {}; o.nope()").unwrap_err(), "o.nope is not a function");
    assert_eq!(
        eval("const o = {}; o.a.b").unwrap_err(),
        "Cannot read properties of undefined (reading 'b')"
    );
    assert_eq!(eval("const k = 1; k = 2").unwrap_err(), "Assignment to constant variable.");
}

#[test]
fn test_thrown_primitive_message() {
    assert_eq!(eval("throw 'plain'").unwrap_err(), "plain");
}

#[test]
fn test_step_budget_is_enforced() {
    let limits = Limits {
        max_steps: 500,
        ..Limits::default()
    };
    let err = eval_with("let n = 0; while (true) { n++ }", limits).unwrap_err();
    assert_eq!(err, "Execution aborted after exceeding 500 evaluation steps");
}

#[test]
fn test_small_programs_fit_the_budget() {
    let limits = Limits {
        max_steps: 500,
        ..Limits::default()
    };
    assert_eq!(eval_with("let n = 0; for (let i = 0; i < 5; i++) { n += i } n", limits), Ok("10".to_string()));
}

#[test]
fn test_unsupported_syntax_is_reported() {
    let err = eval("/ab+c/.test('abc')").unwrap_err();
    assert!(err.contains("regular expression"), "{}", err);
}

// ═══════════════════════════════════════════════════════════════════════════════
// ALLOCATION CAPS
// ═══════════════════════════════════════════════════════════════════════════════

fn small_caps() -> Limits {
    Limits {
        max_string_length: 16,
        max_array_length: 8,
        ..Limits::default()
    }
}

#[test]
fn test_huge_strings_are_range_errors() {
    assert_eq!(eval("'a'.repeat(1e10)").unwrap_err(), "Invalid string length");
    assert_eq!(eval("'a'.padStart(1e10)").unwrap_err(), "Invalid string length");
    assert_eq!(
        eval("let s = 'ab'; for (let i = 0; i < 40; i++) { s = s + s } s.length").unwrap_err(),
        "Invalid string length"
    );
    assert_eq!(
        eval_ok("try { 'a'.repeat(1e10) } catch (e) { e.name }"),
        "RangeError"
    );
}

#[test]
fn test_huge_arrays_are_range_errors() {
    assert_eq!(eval("new Array(1e9)").unwrap_err(), "Invalid array length");
    assert_eq!(eval("new Array(1e10)").unwrap_err(), "Invalid array length");
    assert_eq!(
        eval("let a = [1]; for (let i = 0; i < 40; i++) { a = a.concat(a) } a.length").unwrap_err(),
        "Invalid array length"
    );
}

#[test]
fn test_every_string_builder_respects_the_cap() {
    let cases = [
        "`${'abcdefgh'}${'abcdefgh'}!`",
        "'abcdefgh' + 'abcdefghi'",
        "['abcdefgh', 'abcdefgh', 'x'].join('')",
        "'abcdefgh'.concat('abcdefgh', 'x')",
        "JSON.stringify({ text: 'abcdefghijklmnop' })",
    ];
    for case in cases {
        assert_eq!(eval_with(case, small_caps()), Err("Invalid string length".to_string()), "{}", case);
    }
    assert_eq!(eval_with("('abcdefgh' + 'abcdefgh').length", small_caps()), Ok("16".to_string()));
}

#[test]
fn test_every_array_builder_respects_the_cap() {
    let cases = [
        "[...[1, 2, 3, 4, 5], ...[6, 7, 8, 9]]",
        "[1, 2, 3, 4].concat([5, 6, 7, 8, 9])",
        "const a = []; for (let i = 0; i < 9; i++) { a.push(i) }",
        "Math.max(...[1, 2, 3, 4, 5], ...[6, 7, 8, 9])",
        "Array.from({ length: 9 })",
    ];
    for case in cases {
        assert_eq!(eval_with(case, small_caps()), Err("Invalid array length".to_string()), "{}", case);
    }
    assert_eq!(eval_with("new Array(8).length", small_caps()), Ok("8".to_string()));
}

// ═══════════════════════════════════════════════════════════════════════════════
// NUMBERS, KEYS & ERROR OBJECTS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_number_to_string_switches_to_exponent_form() {
    let out = eval_ok(
        "[String(1e21), String(1e20), String(123456789012345680000), String(0.000001), String(1.5e-7), String(-2.5e22)].join(' ')",
    );
    assert_eq!(out, "1e+21 100000000000000000000 123456789012345680000 0.000001 1.5e-7 -2.5e+22");
}

#[test]
fn test_number_method_argument_ranges() {
    assert_eq!(eval_ok("(255).toString(16)"), "ff");
    assert_eq!(
        eval("(255).toString(1)").unwrap_err(),
        "toString() radix must be between 2 and 36"
    );
    assert_eq!(
        eval("(1).toFixed(101)").unwrap_err(),
        "toFixed() digits argument must be between 0 and 100"
    );
    assert_eq!(eval_ok("try { (1).toFixed(-1) } catch (e) { e.name }"), "RangeError");
}

#[test]
fn test_integer_keys_enumerate_first_in_ascending_order() {
    let out = eval_ok(
        r#"
        const o = { b: 1, 2: 1, a: 1, 1: 1 };
        o[10] = 1;
        const seen = [];
        for (const k in o) seen.push(k);
        Object.keys(o).join() + '|' + seen.join()
        "#,
    );
    assert_eq!(out, "1,2,10,b,a|1,2,10,b,a");
}

#[test]
fn test_string_length_counts_utf16_units() {
    assert_eq!(eval_ok("['😀'.length, 'a😀'.length, 'abc'.length].join()"), "2,3,3");
}

#[test]
fn test_constructor_links_back_to_class() {
    let out = eval_ok(
        r#"
        class A {}
        const caught = [];
        try { throw new TypeError('x') } catch (e) { caught.push(e.constructor === TypeError) }
        try { null.x } catch (e) { caught.push(e.constructor === TypeError, e instanceof TypeError, e.constructor.name === 'TypeError') }
        try { 'a'.repeat(-1) } catch (e) { caught.push(e instanceof RangeError) }
        [new A().constructor === A, new Error('m').constructor === Error, ...caught].join()
        "#,
    );
    assert_eq!(out, "true,true,true,true,true,true,true");
}

#[test]
fn test_cyclic_array_converts_without_recursing() {
    assert_eq!(eval_ok("const a = [1]; a.push(a); String(a)"), "1,");
    assert_eq!(eval_ok("const a = [1, [2]]; a[1].push(a); String(a)"), "1,2,");
}
