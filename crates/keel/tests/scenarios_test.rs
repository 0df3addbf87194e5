//! End-to-end editing scenarios through the command controller.

use keel::{
    AcceptDefaults, Command, CommandController, CommandError, ControllerError, DiagramKind,
    Editor, ErrorCode, Id, MacroBuilder, Model, Owner, Producer, Project, ViewState,
    commands::{AddAttribute, AddToDiagram, CreateClass, CreateGeneralization, DeleteElements},
    config::AppConfig,
    pim::{Attribute, Class, Generalization, Multiplicity},
    psm::{PsmAssociation, PsmClass},
};

#[test]
fn scenario_add_attribute_undo_redo() {
    let mut model = Model::new();
    let class = model
        .add(Class::new(Id::new("Person")), Owner::Classes)
        .expect("class");
    for name in ["name", "email"] {
        model
            .add(
                Attribute::new(class, Id::new(name), Multiplicity::ONE),
                Owner::Attributes(class),
            )
            .expect("attribute");
    }
    let mut controller = CommandController::new(Project::with_model(model));
    let before = controller.project().clone();

    let command = AddAttribute::new(class, Id::new("age"), Multiplicity::new(1, Some(1)));
    let produced = command.produced();
    controller.execute(command).expect("execute");

    let age = produced.value();
    let attributes = controller
        .project()
        .model()
        .class(class)
        .expect("class")
        .attributes()
        .to_vec();
    assert_eq!(attributes.len(), 3);
    let attribute = controller.project().model().attribute(age).expect("age");
    assert_eq!(attribute.name(), Id::new("age"));
    assert_eq!(attribute.multiplicity(), Multiplicity::ONE);
    let index = attributes.iter().position(|id| *id == age);

    controller.undo().expect("undo");
    assert_eq!(controller.project(), &before);

    controller.redo().expect("redo");
    let restored = controller
        .project()
        .model()
        .class(class)
        .expect("class")
        .attributes()
        .to_vec();
    assert_eq!(restored, attributes);
    assert_eq!(restored.iter().position(|id| *id == age), index);
}

#[test]
fn scenario_cyclic_generalization_is_rejected() {
    let mut model = Model::new();
    let a = model
        .add(Class::new(Id::new("A")), Owner::Classes)
        .expect("class");
    let b = model
        .add(Class::new(Id::new("B")), Owner::Classes)
        .expect("class");
    model
        .add(Generalization::new(b, a), Owner::Generalizations)
        .expect("generalization");
    let mut controller = CommandController::new(Project::with_model(model));
    let before = controller.project().clone();

    let error = controller
        .execute(CreateGeneralization::new(a, b))
        .unwrap_err();

    let ControllerError::Command(CommandError::Validation(validation)) = &error else {
        panic!("expected a validation error, got {error:?}");
    };
    assert_eq!(validation.code(), ErrorCode::E202);
    assert!(validation.to_string().starts_with("error[E202]"));
    assert_eq!(controller.project(), &before);
    assert!(!controller.can_undo());
}

#[test]
fn scenario_psm_deletion_order_and_restore() {
    let mut model = Model::new();
    let class = model
        .add(Class::new(Id::new("Order")), Owner::Classes)
        .expect("class");
    let root = model
        .add(PsmClass::new(Id::new("R"), class), Owner::PsmRoots)
        .expect("root");
    let child = model
        .add(PsmClass::new(Id::new("Child"), class), Owner::PsmClasses)
        .expect("child");
    let association = model
        .add(PsmAssociation::new(root, child), Owner::Components(root))
        .expect("association");
    let mut project = Project::with_model(model);
    let psm = project.add_diagram(DiagramKind::Psm, Id::new("Schema"));
    let diagram = project.diagram_mut(psm).expect("diagram");
    diagram.add(root, ViewState::new(0.0, 0.0));
    diagram.add(association, ViewState::new(0.0, 40.0));
    diagram.add(child, ViewState::new(0.0, 80.0));
    let before = project.clone();

    let mut command = DeleteElements::new([root, association, child]);
    command.execute(&mut project).expect("delete");
    let order = command.order().expect("ordered deletion").to_vec();
    let position = |id| order.iter().position(|item| *item == id).expect("ordered");
    assert!(position(association) <= position(root));
    assert!(position(association) <= position(child));
    command.undo(&mut project).expect("undo");
    assert_eq!(project, before);

    let mut editor = Editor::new(before.clone(), AppConfig::default());
    editor
        .delete_from_psm_diagram(psm, [root, association, child], &mut AcceptDefaults)
        .expect("delete");
    assert!(editor.project().diagram(psm).expect("diagram").is_empty());
    editor.undo().expect("undo");
    let present: Vec<_> = editor
        .project()
        .diagram(psm)
        .expect("diagram")
        .elements()
        .collect();
    assert_eq!(present, vec![root, association, child]);
    assert_eq!(editor.project(), &before);
}

#[test]
fn scenario_failed_macro_rolls_back_class_creation() {
    let mut model = Model::new();
    let existing = model
        .add(Class::new(Id::new("Customer")), Owner::Classes)
        .expect("class");
    let mut project = Project::with_model(model);
    let pim = project.add_diagram(DiagramKind::Pim, Id::new("Overview"));
    project
        .diagram_mut(pim)
        .expect("diagram")
        .add(existing, ViewState::default());
    let mut controller = CommandController::new(project);
    let before = controller.project().clone();

    let create = CreateClass::new(Id::new("Invoice"));
    let created = create.produced();
    let command = MacroBuilder::new("Create class in diagram")
        .command(create)
        .command(AddToDiagram::new(existing, pim, ViewState::default()))
        .check_first_only()
        .build();
    let error = controller.execute(command).unwrap_err();

    let ControllerError::Command(CommandError::RolledBack { source, .. }) = &error else {
        panic!("expected a rolled back transaction, got {error:?}");
    };
    assert_eq!(source.validation().map(|e| e.code()), Some(ErrorCode::E204));
    assert!(created.has_value());
    assert_eq!(controller.project().model().classes(), &[existing]);
    assert_eq!(controller.project(), &before);
    assert!(!controller.can_undo());
}
