//! Integration tests for incremental rendering.
//!
//! Each test renders a project into a temp build directory with a recording
//! template engine, then changes the project and renders again.

mod support;

use serde_json::Value;
use std::fs;

use quire_core::config::MemberOrdering;
use quire_core::diff::SNAPSHOT_FILE_NAME;
use quire_core::reflection::{ClassEntity, ClassKind, MethodEntity};
use quire_core::render::{
    RenderError, RenderProgress, RenderStage, Renderer, TemplateError, ThemeManifest, ThemeSet,
};
use support::engine::RecordingEngine;
use support::fixtures::{class, write_theme, Workspace};

fn names(list: &Value) -> Vec<String> {
    list.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// Incremental Behavior
// ============================================================================

mod incremental {
    use super::*;

    #[test]
    fn test_replacing_a_class_renders_only_the_new_one() {
        let ws = Workspace::create();
        let mut renderer = ws.renderer();

        let first = ws.project(vec![class("Acme\\A"), class("Acme\\B")]);
        let diff = renderer.render(&first, None, false).unwrap();
        assert_eq!(diff.modified_classes(), ["Acme\\A", "Acme\\B"]);
        assert!(ws.output("Acme/A.html").is_file());
        assert!(ws.output("Acme/B.html").is_file());
        renderer.engine_mut().reset();

        let second = ws.project(vec![class("Acme\\A"), class("Acme\\C")]);
        let diff = renderer.render(&second, None, false).unwrap();
        assert_eq!(diff.modified_classes(), ["Acme\\C"]);
        assert_eq!(diff.removed_classes(), ["Acme\\B"]);
        assert_eq!(renderer.engine().rendered_classes(), vec!["Acme\\C"]);

        assert!(ws.output("Acme/A.html").is_file());
        assert!(!ws.output("Acme/B.html").exists());
        assert!(ws.output("Acme/C.html").is_file());
    }

    #[test]
    fn test_second_render_without_changes_writes_nothing() {
        let ws = Workspace::create();
        let mut renderer = ws.renderer();
        let project = ws.project(vec![class("Acme\\A")]);

        assert!(!renderer.is_rendered(&project).unwrap());
        renderer.render(&project, None, false).unwrap();
        assert!(renderer.is_rendered(&project).unwrap());

        renderer.engine_mut().reset();
        fs::remove_file(ws.output("index.html")).unwrap();
        let diff = renderer.render(&project, None, false).unwrap();
        assert!(diff.is_empty());
        assert!(diff.is_already_rendered());
        assert!(renderer.engine().calls().is_empty());
        // Not even global pages are rewritten.
        assert!(!ws.output("index.html").exists());
    }

    #[test]
    fn test_snapshot_committed_to_build_dir() {
        let ws = Workspace::create();
        let mut renderer = ws.renderer();
        let diff = renderer
            .render(&ws.project(vec![class("Foo")]), None, false)
            .unwrap();
        assert_eq!(diff.snapshot_path(), ws.output(SNAPSHOT_FILE_NAME));
        assert!(ws.output(SNAPSHOT_FILE_NAME).is_file());
    }

    #[test]
    fn test_removed_namespace_pages_deleted() {
        let ws = Workspace::create();
        let mut renderer = ws.renderer();
        renderer
            .render(
                &ws.project(vec![class("Acme\\A"), class("Other\\C")]),
                None,
                false,
            )
            .unwrap();
        assert!(ws.output("Other.html").is_file());

        let diff = renderer
            .render(&ws.project(vec![class("Acme\\A")]), None, false)
            .unwrap();
        assert_eq!(diff.removed_namespaces(), ["Other"]);
        assert!(!ws.output("Other.html").exists());
        assert!(!ws.output("Other/C.html").exists());
        assert!(ws.output("Acme.html").is_file());
    }

    #[test]
    fn test_parent_change_rerenders_child() {
        let ws = Workspace::create();
        let mut renderer = ws.renderer();
        let mut child = class("Acme\\Child");
        child.set_parent(Some("Acme\\Base".into()));

        renderer
            .render(
                &ws.project(vec![class("Acme\\Base"), child.clone()]),
                None,
                false,
            )
            .unwrap();
        renderer.engine_mut().reset();

        let mut base = class("Acme\\Base");
        base.add_method(MethodEntity::new("boot", 9));
        let diff = renderer
            .render(&ws.project(vec![base, child]), None, false)
            .unwrap();
        assert_eq!(diff.modified_classes(), ["Acme\\Base", "Acme\\Child"]);
    }

    #[test]
    fn test_force_flushes_template_cache() {
        let ws = Workspace::create();
        let mut renderer = ws.renderer();
        let project = ws.project(vec![class("Foo")]);
        renderer.render(&project, None, false).unwrap();

        let cache_dir = ws.config().template_cache_dir();
        let marker = cache_dir.join("compiled.cache");
        fs::write(&marker, "stale").unwrap();

        let diff = renderer.render(&project, None, true).unwrap();
        assert!(diff.is_empty());
        assert!(!marker.exists());
        assert_eq!(renderer.engine().cache_dir(), Some(cache_dir.as_path()));
    }
}

// ============================================================================
// Pages
// ============================================================================

mod pages {
    use super::*;

    #[test]
    fn test_depth_relative_root_path() {
        let ws = Workspace::create();
        let mut renderer = ws.renderer();
        renderer
            .render(&ws.project(vec![class("Acme\\Http\\Client")]), None, false)
            .unwrap();

        assert_eq!(ws.page("index.html")["root_path"], "");
        assert_eq!(ws.page("Acme/Http.html")["root_path"], "../");
        assert_eq!(ws.page("Acme/Http/Client.html")["root_path"], "../../");

        let class_call = renderer
            .engine()
            .calls()
            .iter()
            .find(|c| c.template == "class.tpl")
            .unwrap();
        assert_eq!(class_call.root_path, "../../");
        assert_eq!(class_call.context["class"]["short_name"], "Client");
    }

    #[test]
    fn test_engine_configured_from_theme() {
        let ws = Workspace::create();
        let mut renderer = ws.renderer();
        renderer
            .render(&ws.project(vec![class("Acme\\A")]), None, false)
            .unwrap();

        let engine = renderer.engine();
        assert_eq!(
            engine.search_paths(),
            [ws.themes_dir().join("default"), ws.themes_dir()]
        );
        assert_eq!(engine.global("has_namespaces"), Some(&Value::Bool(true)));
        assert_eq!(engine.global("project").unwrap()["title"], "API");
    }

    #[test]
    fn test_global_and_namespace_variables() {
        let ws = Workspace::create();
        let mut renderer = ws.renderer();
        let mut iface = ClassEntity::new("Acme\\Runnable", 1);
        iface.set_kind(ClassKind::Interface);
        let mut error = ClassEntity::new("Acme\\Failure", 1);
        error.set_parent(Some("Exception".into()));
        renderer
            .render(
                &ws.project(vec![class("Acme\\A"), iface, error]),
                None,
                false,
            )
            .unwrap();

        let index = ws.page("index.html");
        assert_eq!(index["context"]["namespaces"][0], "Acme");
        assert_eq!(names(&index["context"]["interfaces"]), vec!["Acme\\Runnable"]);
        assert_eq!(index["context"]["tree"][0]["label"], "Acme");

        let namespace_page = ws.page("Acme.html");
        let namespace = &namespace_page["context"];
        assert_eq!(namespace["namespace"], "Acme");
        assert_eq!(names(&namespace["classes"]), vec!["Acme\\A"]);
        assert_eq!(names(&namespace["interfaces"]), vec!["Acme\\Runnable"]);
        assert_eq!(names(&namespace["exceptions"]), vec!["Acme\\Failure"]);
    }

    #[test]
    fn test_static_files_copied() {
        let ws = Workspace::create();
        let mut renderer = ws.renderer();
        renderer
            .render(&ws.project(vec![class("Foo")]), None, false)
            .unwrap();
        assert_eq!(
            fs::read_to_string(ws.output("css/main.css")).unwrap(),
            "template css/main.css"
        );
    }

    #[test]
    fn test_child_theme_overrides_static_file() {
        let ws = Workspace::create();
        let dark = write_theme(
            &ws.themes_dir(),
            "dark",
            r#"{"name": "dark", "parent": "default"}"#,
            &[],
        );
        fs::create_dir_all(dark.join("css")).unwrap();
        fs::write(dark.join("css/main.css"), "dark css").unwrap();

        let mut project = ws.project(vec![class("Foo")]);
        project.config_mut().theme = "dark".to_string();
        let mut renderer = ws.renderer();
        renderer.render(&project, None, false).unwrap();

        assert_eq!(
            fs::read_to_string(ws.output("css/main.css")).unwrap(),
            "dark css"
        );
        // Templates come from the parent theme.
        assert!(ws.output("Foo.html").is_file());
    }
}

// ============================================================================
// Class Members
// ============================================================================

mod members {
    use super::*;

    fn with_methods(name: &str, methods: &[&str]) -> ClassEntity {
        let mut class = ClassEntity::new(name, 1);
        for (line, method) in methods.iter().enumerate() {
            class.add_method(MethodEntity::new(*method, line as u32 + 2));
        }
        class
    }

    #[test]
    fn test_inherited_members_merged() {
        let ws = Workspace::create();
        let mut child = with_methods("Acme\\Child", &["run"]);
        child.set_parent(Some("Acme\\Base".into()));
        let project = ws.project(vec![with_methods("Acme\\Base", &["boot"]), child]);

        ws.renderer().render(&project, None, false).unwrap();
        let page = ws.page("Acme/Child.html");
        assert_eq!(names(&page["context"]["methods"]), vec!["boot", "run"]);
        assert_eq!(page["context"]["methods"][0]["class"], "Acme\\Base");
    }

    #[test]
    fn test_inherited_members_excluded_when_disabled() {
        let ws = Workspace::create();
        let mut child = with_methods("Acme\\Child", &["run"]);
        child.set_parent(Some("Acme\\Base".into()));
        let mut project = ws.project(vec![with_methods("Acme\\Base", &["boot"]), child]);
        project.config_mut().include_parent_data = false;

        ws.renderer().render(&project, None, false).unwrap();
        let page = ws.page("Acme/Child.html");
        assert_eq!(names(&page["context"]["methods"]), vec!["run"]);
    }

    #[test]
    fn test_member_ordering() {
        let ws = Workspace::create();
        let mut project = ws.project(vec![with_methods("Foo", &["b", "c", "a"])]);

        ws.renderer().render(&project, None, false).unwrap();
        assert_eq!(
            names(&ws.page("Foo.html")["context"]["methods"]),
            vec!["a", "b", "c"]
        );

        project.config_mut().sort.methods = MemberOrdering::Declaration;
        ws.renderer().render(&project, None, false).unwrap();
        assert_eq!(
            names(&ws.page("Foo.html")["context"]["methods"]),
            vec!["b", "c", "a"]
        );

        project.config_mut().sort.methods = MemberOrdering::custom(|a, b| b.cmp(a));
        ws.renderer().render(&project, None, false).unwrap();
        assert_eq!(
            names(&ws.page("Foo.html")["context"]["methods"]),
            vec!["c", "b", "a"]
        );
    }
}

// ============================================================================
// Progress and Failures
// ============================================================================

mod progress_and_failures {
    use super::*;

    #[test]
    fn test_progress_reports_every_unit() {
        let ws = Workspace::create();
        let mut renderer = ws.renderer();
        let project = ws.project(vec![class("Acme\\A"), class("Acme\\B"), class("Other\\C")]);

        let mut reports = Vec::new();
        let mut record = |p: &RenderProgress<'_>| {
            reports.push((p.stage, p.subject.to_string(), p.step, p.total));
        };
        renderer.render(&project, Some(&mut record), false).unwrap();

        let expected: Vec<(RenderStage, String, usize, usize)> = [
            (RenderStage::Static, "Rendering files"),
            (RenderStage::Global, "index.html"),
            (RenderStage::Global, "classes.html"),
            (RenderStage::Namespace, "Acme"),
            (RenderStage::Namespace, "Other"),
            (RenderStage::Class, "Acme\\A"),
            (RenderStage::Class, "Acme\\B"),
            (RenderStage::Class, "Other\\C"),
        ]
        .into_iter()
        .enumerate()
        .map(|(step, (stage, subject))| (stage, subject.to_string(), step, 8))
        .collect();
        assert_eq!(reports, expected);
    }

    #[test]
    fn test_missing_template_dir_is_fatal() {
        let ws = Workspace::create();
        let mut themes = ThemeSet::new();
        themes.add(
            ThemeManifest {
                name: "default".into(),
                ..Default::default()
            },
            ws.temp.path().join("missing"),
        );
        let mut renderer = Renderer::new(RecordingEngine::new(), themes);

        let err = renderer
            .render(&ws.project(vec![class("Foo")]), None, false)
            .unwrap_err();
        assert!(matches!(err, RenderError::TemplateDirMissing { .. }));
        assert!(!ws.output(SNAPSHOT_FILE_NAME).exists());
    }

    #[test]
    fn test_unknown_theme_is_fatal() {
        let ws = Workspace::create();
        let mut project = ws.project(vec![class("Foo")]);
        project.config_mut().theme = "nope".to_string();

        let err = ws.renderer().render(&project, None, false).unwrap_err();
        assert!(matches!(err, RenderError::Theme(_)));
    }

    #[test]
    fn test_template_failure_aborts_without_commit() {
        let ws = Workspace::create();
        let mut renderer = ws.renderer_with(RecordingEngine::failing_on("class.tpl"));
        let project = ws.project(vec![class("Foo")]);

        let err = renderer.render(&project, None, false).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Template(TemplateError::Render { .. })
        ));
        assert!(!ws.output(SNAPSHOT_FILE_NAME).exists());

        renderer.engine_mut().stop_failing();
        renderer.engine_mut().reset();
        let diff = renderer.render(&project, None, false).unwrap();
        assert_eq!(diff.modified_classes(), ["Foo"]);
        assert_eq!(renderer.engine().rendered_classes(), vec!["Foo"]);
    }
}
