//! Tests for the visible-name lookup path of the bridge

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use symbridge_core::ast::{
    AstContext, BuiltinType, DeclCategory, DeclId, DeclKind, DeclarationName, OperatorKind, StorageClass, TagKind,
    TypeDesc,
};
use symbridge_core::source::{
    ExternalAstSource, ExternalDeclSource, ExternalLoadResult, ExternalResolver, NameSearchContext,
};
use symbridge_core::symbols::{ExternalSymbol, SymbolTable};
use symbridge_core::target::{Module, Target};
use symbridge_core::BridgeConfig;

/// Answers every query with one `int` variable and counts how often it ran.
#[derive(Default)]
struct CountingResolver
{
    calls: Cell<usize>,
}

impl ExternalResolver for CountingResolver
{
    fn find_external_visible_decls(&self, context: &mut NameSearchContext<'_, '_>)
    {
        self.calls.set(self.calls.get() + 1);
        let int = context.ast_mut().builtin_type(BuiltinType::Int);
        context.add_var_decl(int);
    }
}

/// Looks its own name up again before answering.
#[derive(Default)]
struct ReentrantResolver
{
    calls: Cell<usize>,
    nested: RefCell<Vec<(Vec<DeclId>, bool)>>,
}

impl ExternalResolver for ReentrantResolver
{
    fn find_external_visible_decls(&self, context: &mut NameSearchContext<'_, '_>)
    {
        self.calls.set(self.calls.get() + 1);
        let scope = context.scope();
        let name = context.name().clone();

        let nested = context.lookup_nested(scope, &name);
        let committed = context.ast().cached_lookup(scope, &name).is_some();
        self.nested.borrow_mut().push((nested, committed));

        let int = context.ast_mut().builtin_type(BuiltinType::Int);
        context.add_var_decl(int);
    }
}

fn bound_bridge<'t>(ast: &mut AstContext, resolver: Rc<dyn ExternalResolver>) -> ExternalDeclSource<'t>
{
    let mut bridge = ExternalDeclSource::detached().with_resolver(resolver);
    bridge.start_translation_unit(ast);
    bridge
}

fn ident(name: &str) -> DeclarationName
{
    DeclarationName::identifier(name)
}

#[test]
fn test_special_name_kinds_are_never_looked_up()
{
    let mut ast = AstContext::new();
    let resolver = Rc::new(CountingResolver::default());
    let mut bridge = bound_bridge(&mut ast, resolver.clone());
    let tu = ast.translation_unit();
    let int = ast.builtin_type(BuiltinType::Int);

    let names = [
        DeclarationName::Operator(OperatorKind::Plus),
        DeclarationName::LiteralOperator("_km".to_string()),
        DeclarationName::ZeroArgSelector("count".to_string()),
        DeclarationName::OneArgSelector("objectAtIndex".to_string()),
        DeclarationName::MultiArgSelector(vec!["insert".to_string(), "atIndex".to_string()]),
        DeclarationName::Constructor(int),
        DeclarationName::Destructor(int),
        DeclarationName::ConversionFunction(int),
    ];

    for enabled in [false, true] {
        if enabled {
            bridge.enable_lookups();
        }
        for name in &names {
            assert!(bridge.lookup_visible_by_name(&mut ast, tu, name).is_empty());
            assert!(ast.cached_lookup(tu, name).is_none(), "{name} must not be committed");
            assert_eq!(bridge.active_lookup_count(), 0);
            assert_eq!(bridge.lookups_enabled(), enabled);
        }
    }
    assert_eq!(resolver.calls.get(), 0);
}

#[test]
fn test_lookup_before_activation_is_not_committed()
{
    let mut ast = AstContext::new();
    let resolver = Rc::new(CountingResolver::default());
    let mut bridge = bound_bridge(&mut ast, resolver.clone());
    let tu = ast.translation_unit();

    assert!(bridge.lookup_visible_by_name(&mut ast, tu, &ident("foo")).is_empty());
    assert!(!bridge.lookups_enabled());
    assert!(ast.cached_lookup(tu, &ident("foo")).is_none());

    // The activating identifier itself is not resolved.
    assert!(bridge.lookup_visible_by_name(&mut ast, tu, &ident("$foo")).is_empty());
    assert!(bridge.lookups_enabled());
    assert!(ast.cached_lookup(tu, &ident("$foo")).is_none());
    assert_eq!(resolver.calls.get(), 0);

    let bar = bridge.lookup_visible_by_name(&mut ast, tu, &ident("bar"));
    assert_eq!(bar.len(), 1);
    assert_eq!(resolver.calls.get(), 1);
    assert_eq!(ast.cached_lookup(tu, &ident("bar")), Some(bar.as_slice()));

    // "foo" was never committed, so it is resolved for real now.
    let foo = ast.lookup_name(tu, &ident("foo"), &mut bridge);
    assert_eq!(foo.len(), 1);
    assert_eq!(resolver.calls.get(), 2);
}

#[test]
fn test_activation_stays_on()
{
    let mut ast = AstContext::new();
    let resolver = Rc::new(CountingResolver::default());
    let mut bridge = bound_bridge(&mut ast, resolver.clone());
    let tu = ast.translation_unit();

    bridge.lookup_visible_by_name(&mut ast, tu, &ident("$x"));
    for name in ["a", "b", "c"] {
        bridge.lookup_visible_by_name(&mut ast, tu, &ident(name));
    }
    assert!(bridge.lookups_enabled());
    assert_eq!(resolver.calls.get(), 3);
}

#[test]
fn test_custom_activation_char()
{
    let mut ast = AstContext::new();
    let resolver = Rc::new(CountingResolver::default());
    let config = BridgeConfig::default().with_activation_char('@');
    let mut bridge = ExternalDeclSource::with_config(None, config).with_resolver(resolver.clone());
    bridge.start_translation_unit(&mut ast);
    let tu = ast.translation_unit();

    bridge.lookup_visible_by_name(&mut ast, tu, &ident("$x"));
    assert!(!bridge.lookups_enabled());
    bridge.lookup_visible_by_name(&mut ast, tu, &ident("@x"));
    assert!(bridge.lookups_enabled());
    assert_eq!(resolver.calls.get(), 0);
}

#[test]
fn test_reentrant_lookup_returns_uncommitted_empty()
{
    let mut ast = AstContext::new();
    let resolver = Rc::new(ReentrantResolver::default());
    let mut bridge = bound_bridge(&mut ast, resolver.clone());
    bridge.enable_lookups();
    let tu = ast.translation_unit();

    let outer = ast.lookup_name(tu, &ident("x"), &mut bridge);
    assert_eq!(outer.len(), 1);
    assert_eq!(resolver.calls.get(), 1);

    {
        let nested = resolver.nested.borrow();
        assert_eq!(nested.len(), 1);
        let (nested_result, committed_during_outer) = &nested[0];
        assert!(nested_result.is_empty());
        assert!(!committed_during_outer);
    }

    assert!(!bridge.is_active_lookup("x"));
    assert_eq!(bridge.active_lookup_count(), 0);

    // A fresh query is answered from the cache without resolving again.
    let again = ast.lookup_name(tu, &ident("x"), &mut bridge);
    assert_eq!(again, outer);
    assert_eq!(resolver.calls.get(), 1);
}

#[test]
fn test_nested_lookup_of_another_name_is_resolved()
{
    struct Chained
    {
        calls: Cell<usize>,
    }

    impl ExternalResolver for Chained
    {
        fn find_external_visible_decls(&self, context: &mut NameSearchContext<'_, '_>)
        {
            self.calls.set(self.calls.get() + 1);
            if context.name().as_identifier() == Some("outer") {
                let scope = context.scope();
                let inner = context.lookup_nested(scope, &DeclarationName::identifier("inner"));
                context.add_lookup_result(&inner);
            } else {
                let int = context.ast_mut().builtin_type(BuiltinType::Int);
                context.add_var_decl(int);
            }
        }
    }

    let mut ast = AstContext::new();
    let resolver = Rc::new(Chained { calls: Cell::new(0) });
    let mut bridge = bound_bridge(&mut ast, resolver.clone());
    bridge.enable_lookups();
    let tu = ast.translation_unit();

    let outer = ast.lookup_name(tu, &ident("outer"), &mut bridge);
    assert_eq!(resolver.calls.get(), 2);
    assert_eq!(outer.len(), 1);
    assert_eq!(ast.cached_lookup(tu, &ident("inner")), Some(outer.as_slice()));
    assert_eq!(ast.decl(outer[0]).name(), Some("inner"));
}

#[test]
fn test_unbound_bridge_commits_negative()
{
    let mut ast = AstContext::new();
    let resolver = Rc::new(CountingResolver::default());
    let mut bridge = ExternalDeclSource::detached().with_resolver(resolver.clone());
    bridge.enable_lookups();
    let tu = ast.translation_unit();

    assert!(bridge.lookup_visible_by_name(&mut ast, tu, &ident("value")).is_empty());
    assert_eq!(ast.cached_lookup(tu, &ident("value")), Some(&[][..]));
    assert_eq!(resolver.calls.get(), 0);
}

#[test]
fn test_query_from_other_context_commits_negative()
{
    let mut bound = AstContext::new();
    let mut other = AstContext::new();
    let resolver = Rc::new(CountingResolver::default());
    let mut bridge = bound_bridge(&mut bound, resolver.clone());
    bridge.enable_lookups();
    let tu = other.translation_unit();

    assert!(bridge.lookup_visible_by_name(&mut other, tu, &ident("value")).is_empty());
    assert_eq!(other.cached_lookup(tu, &ident("value")), Some(&[][..]));

    bridge.release_ast_context();
    let bound_tu = bound.translation_unit();
    assert!(bridge.lookup_visible_by_name(&mut bound, bound_tu, &ident("value")).is_empty());
    assert_eq!(bound.cached_lookup(bound_tu, &ident("value")), Some(&[][..]));
    assert_eq!(resolver.calls.get(), 0);
}

#[test]
fn test_import_in_progress_commits_negative()
{
    let mut ast = AstContext::new();
    let resolver = Rc::new(CountingResolver::default());
    let mut bridge = bound_bridge(&mut ast, resolver.clone());
    bridge.enable_lookups();
    let tu = ast.translation_unit();

    bridge.set_import_in_progress(true);
    assert!(bridge.lookup_visible_by_name(&mut ast, tu, &ident("first")).is_empty());
    assert_eq!(ast.cached_lookup(tu, &ident("first")), Some(&[][..]));

    bridge.set_import_in_progress(false);
    assert_eq!(bridge.lookup_visible_by_name(&mut ast, tu, &ident("second")).len(), 1);
    assert_eq!(resolver.calls.get(), 1);
}

#[test]
fn test_builtin_and_using_directive_commit_negative()
{
    let mut ast = AstContext::new();
    let resolver = Rc::new(CountingResolver::default());
    let mut bridge = bound_bridge(&mut ast, resolver.clone());
    bridge.enable_lookups();
    let tu = ast.translation_unit();

    let builtin = ident("__builtin_memcpy");
    assert!(bridge.lookup_visible_by_name(&mut ast, tu, &builtin).is_empty());
    assert_eq!(ast.cached_lookup(tu, &builtin), Some(&[][..]));

    let using = DeclarationName::UsingDirective;
    assert!(bridge.lookup_visible_by_name(&mut ast, tu, &using).is_empty());
    assert_eq!(ast.cached_lookup(tu, &using), Some(&[][..]));

    assert_eq!(resolver.calls.get(), 0);
}

#[test]
fn test_empty_resolution_is_committed()
{
    let mut ast = AstContext::new();
    let mut target = Target::new();
    target
        .images_mut()
        .append(Module::with_backend("/bin/app", SymbolTable::new()));
    let mut bridge = ExternalDeclSource::new(&target);
    bridge.start_translation_unit(&mut ast);
    bridge.enable_lookups();
    let tu = ast.translation_unit();

    assert!(ast.lookup_name(tu, &ident("nothing"), &mut bridge).is_empty());
    assert_eq!(ast.cached_lookup(tu, &ident("nothing")), Some(&[][..]));
}

#[test]
fn test_lookup_lexical_reports_empty_success()
{
    let mut ast = AstContext::new();
    let mut bridge = bound_bridge(&mut ast, Rc::new(CountingResolver::default()));
    let tu = ast.translation_unit();

    let mut result = Vec::new();
    let outcome = bridge.lookup_lexical(&ast, tu, &|category| category == DeclCategory::Variable, &mut result);
    assert_eq!(outcome, ExternalLoadResult::Success);
    assert!(result.is_empty());
}

#[test]
fn test_type_completion_is_a_no_op()
{
    let mut ast = AstContext::new();
    let mut bridge = bound_bridge(&mut ast, Rc::new(CountingResolver::default()));
    let tu = ast.translation_unit();
    let tag = ast.create_tag(tu, "point", TagKind::Struct);
    let interface = ast.create_interface(tu, "NSObject");
    let before = ast.decl_count();

    bridge.complete_tag_type(&mut ast, tag);
    bridge.complete_interface_type(&mut ast, interface);

    assert_eq!(ast.decl_count(), before);
}

#[test]
fn test_module_resolver_synthesizes_declarations()
{
    let mut table = SymbolTable::new();
    table.add_symbol(None, ExternalSymbol::variable("errno", TypeDesc::Builtin(BuiltinType::Int)));
    table.add_symbol(
        None,
        ExternalSymbol::function(
            "add",
            TypeDesc::function(
                TypeDesc::Builtin(BuiltinType::Int),
                vec![TypeDesc::Builtin(BuiltinType::Int), TypeDesc::Builtin(BuiltinType::Int)],
            ),
        ),
    );
    table.add_symbol(None, ExternalSymbol::unknown_function("puts"));
    table.add_symbol(
        None,
        ExternalSymbol::type_decl("point", TypeDesc::record(TagKind::Struct, "point")),
    );

    let mut target = Target::new();
    target.images_mut().append(Module::with_backend("/bin/app", table));
    let mut ast = AstContext::new();
    let mut bridge = ExternalDeclSource::new(&target);
    bridge.start_translation_unit(&mut ast);
    bridge.enable_lookups();
    let tu = ast.translation_unit();

    let errno = ast.lookup_name(tu, &ident("errno"), &mut bridge);
    assert_eq!(errno.len(), 1);
    assert_eq!(ast.describe_decl(errno[0]), "static int errno");

    let add = ast.lookup_name(tu, &ident("add"), &mut bridge);
    assert_eq!(add.len(), 1);
    assert_eq!(ast.decl(add[0]).params().len(), 2);
    assert_eq!(ast.decl(add[0]).storage_class(), Some(StorageClass::Static));

    let puts = ast.lookup_name(tu, &ident("puts"), &mut bridge);
    assert_eq!(puts.len(), 1);
    assert_eq!(ast.describe_decl(puts[0]), "static function puts: __unknown_any (...)");

    let point = ast.lookup_name(tu, &ident("point"), &mut bridge);
    assert_eq!(point.len(), 1);
    assert!(matches!(
        ast.decl(point[0]).kind(),
        DeclKind::Tag {
            kind: TagKind::Struct
        }
    ));
}

#[test]
fn test_qualified_lookup_descends_through_namespaces()
{
    let mut table = SymbolTable::new();
    let outer = table.add_namespace(None, "outer");
    let inner = table.add_namespace(Some(&outer), "inner");
    table.add_symbol(Some(&outer), ExternalSymbol::variable("value", TypeDesc::Builtin(BuiltinType::Double)));
    table.add_symbol(Some(&inner), ExternalSymbol::unknown_function("helper"));

    let mut target = Target::new();
    target.images_mut().append(Module::with_backend("/bin/app", table));
    let mut ast = AstContext::new();
    let mut bridge = ExternalDeclSource::new(&target);
    bridge.start_translation_unit(&mut ast);
    bridge.enable_lookups();
    let tu = ast.translation_unit();

    let outer_decls = ast.lookup_name(tu, &ident("outer"), &mut bridge);
    assert_eq!(outer_decls.len(), 1);
    let outer_ns = outer_decls[0];
    assert!(ast.decl(outer_ns).is_namespace());
    assert!(ast.decl(outer_ns).has_external_visible_storage());
    assert_eq!(bridge.namespace_map(outer_ns).map(|map| map.len()), Some(1));

    let value = ast.lookup_name(outer_ns, &ident("value"), &mut bridge);
    assert_eq!(value.len(), 1);
    assert_eq!(ast.describe_decl(value[0]), "static double value");
    assert_eq!(ast.decl(value[0]).context(), Some(outer_ns));

    // Symbols of a namespace are not visible at top level.
    assert!(ast.lookup_name(tu, &ident("value"), &mut bridge).is_empty());

    let inner_decls = ast.lookup_name(outer_ns, &ident("inner"), &mut bridge);
    assert_eq!(inner_decls.len(), 1);
    let helper = ast.lookup_name(inner_decls[0], &ident("helper"), &mut bridge);
    assert_eq!(helper.len(), 1);
    assert_eq!(ast.decl(helper[0]).context(), Some(inner_decls[0]));
}

#[test]
fn test_namespace_in_two_modules_yields_one_declaration()
{
    let mut first = SymbolTable::new();
    let ns = first.add_namespace(None, "shared");
    first.add_symbol(Some(&ns), ExternalSymbol::variable("count", TypeDesc::Builtin(BuiltinType::Int)));
    let mut second = SymbolTable::new();
    let ns = second.add_namespace(None, "shared");
    second.add_symbol(Some(&ns), ExternalSymbol::variable("count", TypeDesc::Builtin(BuiltinType::Long)));

    let mut target = Target::new();
    target.images_mut().append(Module::with_backend("/lib/libfirst.so", first));
    target.images_mut().append(Module::with_backend("/lib/libsecond.so", second));
    let mut ast = AstContext::new();
    let mut bridge = ExternalDeclSource::new(&target);
    bridge.start_translation_unit(&mut ast);
    bridge.enable_lookups();
    let tu = ast.translation_unit();

    let shared = ast.lookup_name(tu, &ident("shared"), &mut bridge);
    assert_eq!(shared.len(), 1);
    assert_eq!(bridge.namespace_map(shared[0]).map(|map| map.len()), Some(2));

    let counts = ast.lookup_name(shared[0], &ident("count"), &mut bridge);
    let described: Vec<String> = counts.iter().map(|decl| ast.describe_decl(*decl)).collect();
    assert_eq!(described, ["static int count", "static long count"]);
}

fn app_target() -> Target
{
    let mut table = SymbolTable::new();
    let app = table.add_namespace(None, "app");
    table.add_symbol(Some(&app), ExternalSymbol::variable("counter", TypeDesc::Builtin(BuiltinType::Int)));
    let mut target = Target::new();
    target.images_mut().append(Module::with_backend("/bin/app", table));
    target
}

#[test]
fn test_rebinding_same_context_keeps_namespaces_searchable()
{
    let target = app_target();
    let mut ast = AstContext::new();
    let mut bridge = ExternalDeclSource::new(&target);
    bridge.start_translation_unit(&mut ast);
    bridge.enable_lookups();
    let tu = ast.translation_unit();

    let app = ast.lookup_name(tu, &ident("app"), &mut bridge)[0];

    bridge.start_translation_unit(&mut ast);
    let counter = ast.lookup_name(app, &ident("counter"), &mut bridge);
    assert_eq!(counter.len(), 1);
    assert_eq!(ast.describe_decl(counter[0]), "static int counter");

    bridge.release_ast_context();
    bridge.start_translation_unit(&mut ast);
    let missing = ident("missing");
    assert!(ast.lookup_name(app, &missing, &mut bridge).is_empty());
    assert!(bridge.namespace_map(app).is_some());
}

#[test]
fn test_binding_another_context_drops_namespace_maps()
{
    let target = app_target();
    let mut first = AstContext::new();
    let mut bridge = ExternalDeclSource::new(&target);
    bridge.start_translation_unit(&mut first);
    bridge.enable_lookups();
    let tu = first.translation_unit();

    let app = first.lookup_name(tu, &ident("app"), &mut bridge)[0];
    assert!(bridge.namespace_map(app).is_some());

    let mut second = AstContext::new();
    bridge.start_translation_unit(&mut second);
    assert!(bridge.namespace_map(app).is_none());
}
