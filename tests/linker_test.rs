use dsnlinks::config::LinkerConfig;
use dsnlinks::errors::{DsnLinksError, Result};
use dsnlinks::host::{HostGraph, MemoryGraph};
use dsnlinks::linker::DatasetLinker;
use dsnlinks::types::*;

const STEP: &str = "CAST_JCL_Step";

fn position(file: &str, begin_line: u32, code: &str) -> Position {
    Position {
        file: file.to_string(),
        begin_line,
        code: Some(code.to_string()),
    }
}

/// Graph with a `DataSets` folder, an FTP program, a CDSEND procedure and
/// one resolved dataset `PROD.INPUT`.
struct Fixture {
    graph: MemoryGraph,
    folder: HostObject,
    ftp: HostObject,
    cdsend: HostObject,
    resolved: HostObject,
}

fn setup() -> Fixture {
    let mut graph = MemoryGraph::new();
    let folder = graph
        .add_object("DataSets", "CAST_JCL_RootDirectory", None)
        .unwrap();
    let ftp = graph.add_object("ftp", "JCL_PROGRAM", None).unwrap();
    let cdsend = graph
        .add_object("CDSEND", "CAST_JCL_CatalogedProcedure", None)
        .unwrap();
    let resolved = graph
        .add_object("PROD.INPUT", "CAST_JCL_ResolvedDataset", Some(folder.id.as_str()))
        .unwrap();
    Fixture {
        graph,
        folder,
        ftp,
        cdsend,
        resolved,
    }
}

fn run(graph: &mut MemoryGraph) -> ExtractionReport {
    DatasetLinker::new(graph, LinkerConfig::default())
        .run()
        .expect("run should succeed")
}

#[test]
fn test_ftp_block_creates_write_links() {
    let mut fx = setup();
    let step = fx.graph.add_object("STEP1", STEP, None).unwrap();
    fx.graph
        .add_call(
            &step.id,
            &fx.ftp.id,
            vec![position(
                "JOB1.jcl",
                10,
                "open host\nGET PROD.INPUT LOCAL.COPY\nquit",
            )],
        )
        .unwrap();

    let report = run(&mut fx.graph);

    assert_eq!(report.links_scanned, 1);
    assert_eq!(report.references, 2);
    assert_eq!(report.edges_created, 2);
    assert_eq!(report.placeholders_created, 1);
    assert!(report.failures.is_empty());

    let links = fx.graph.links_from(&step.id);
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].target, fx.resolved.id);
    assert!(links.iter().all(|l| l.kind == AccessKind::Write));
    assert_eq!(
        links[0].bookmark,
        Bookmark {
            file: "JOB1.jcl".to_string(),
            begin_line: 11,
            begin_column: 1,
            end_line: 11,
            end_column: 25,
        }
    );
    assert_eq!(links[1].bookmark, links[0].bookmark);

    let placeholder = fx.graph.get_object(&links[1].target).unwrap();
    assert_eq!(placeholder.name, "LOCAL.COPY");
    assert_eq!(placeholder.type_name, "FTP_Unknown_JCL_Dataset");
    assert_eq!(placeholder.parent.as_deref(), Some(fx.folder.id.as_str()));
}

#[test]
fn test_second_run_reuses_placeholders() {
    let mut fx = setup();
    let step = fx.graph.add_object("STEP1", STEP, None).unwrap();
    fx.graph
        .add_call(&step.id, &fx.ftp.id, vec![position("JOB1.jcl", 1, "GET X.Y")])
        .unwrap();

    let first = run(&mut fx.graph);
    assert_eq!(first.edges_created, 1);
    assert_eq!(first.placeholders_created, 1);
    let objects = fx.graph.object_count();

    let second = run(&mut fx.graph);
    assert!(second.failures.is_empty());
    assert_eq!(second.edges_created, 1);
    assert_eq!(second.placeholders_created, 0);
    assert_eq!(fx.graph.object_count(), objects);

    let links = fx.graph.links_from(&step.id);
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].target, links[1].target);
}

#[test]
fn test_cdsend_block_creates_generic_links() {
    let mut fx = setup();
    let step = fx.graph.add_object("STEP2", STEP, None).unwrap();
    fx.graph
        .add_call(
            &step.id,
            &fx.cdsend.id,
            vec![position("JOB2.jcl", 20, "&&DSNMY.DATA-\nSET.NAME")],
        )
        .unwrap();

    let report = run(&mut fx.graph);
    assert_eq!(report.edges_created, 1);

    let links = fx.graph.links_from(&step.id);
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].kind, AccessKind::Generic);
    assert_eq!(links[0].bookmark.begin_line, 20);
    assert_eq!(links[0].bookmark.end_line, 21);
    assert_eq!(links[0].bookmark.end_column, 8);
    assert_eq!(
        fx.graph.get_object(&links[0].target).unwrap().name,
        "MY.DATASET.NAME"
    );
}

#[test]
fn test_repeated_name_gives_one_node_many_links() {
    let mut fx = setup();
    let step = fx.graph.add_object("STEP1", STEP, None).unwrap();
    fx.graph
        .add_call(
            &step.id,
            &fx.ftp.id,
            vec![position("JOB.jcl", 1, "PUT A.B\nGET A.B")],
        )
        .unwrap();

    let report = run(&mut fx.graph);
    assert_eq!(report.edges_created, 2);
    assert_eq!(report.placeholders_created, 1);

    let links = fx.graph.links_from(&step.id);
    assert_eq!(links[0].target, links[1].target);
    assert_eq!(links[0].kind, AccessKind::Read);
    assert_eq!(links[1].kind, AccessKind::Write);
}

#[test]
fn test_no_landmarks_does_nothing() {
    let mut graph = MemoryGraph::new();
    let step = graph.add_object("STEP1", STEP, None).unwrap();
    let other = graph.add_object("IEFBR14", "JCL_PROGRAM", None).unwrap();
    graph
        .add_call(&step.id, &other.id, vec![position("J.jcl", 1, "GET A B")])
        .unwrap();
    let before = graph.object_count();

    let report = run(&mut graph);

    assert_eq!(report, ExtractionReport::default());
    assert_eq!(graph.object_count(), before);
    assert!(graph.reference_links().is_empty());
}

#[test]
fn test_only_job_steps_are_callers() {
    let mut fx = setup();
    let proc_step = fx.graph.add_object("PSTEP", "CAST_JCL_Procedure", None).unwrap();
    fx.graph
        .add_call(&proc_step.id, &fx.ftp.id, vec![position("P.jcl", 1, "GET A B")])
        .unwrap();

    let report = run(&mut fx.graph);
    assert_eq!(report.landmarks, 2);
    assert_eq!(report.links_scanned, 0);
    assert!(fx.graph.reference_links().is_empty());
}

#[test]
fn test_links_without_positions_are_skipped() {
    let mut fx = setup();
    let step = fx.graph.add_object("STEP1", STEP, None).unwrap();
    fx.graph.add_call(&step.id, &fx.ftp.id, vec![]).unwrap();

    let report = run(&mut fx.graph);
    assert_eq!(report.links_skipped, 1);
    assert_eq!(report.links_scanned, 0);
    assert!(report.failures.is_empty());
}

#[test]
fn test_missing_text_is_reported_and_run_continues() {
    let mut fx = setup();
    let step1 = fx.graph.add_object("STEP1", STEP, None).unwrap();
    let step2 = fx.graph.add_object("STEP2", STEP, None).unwrap();
    fx.graph
        .add_call(
            &step1.id,
            &fx.ftp.id,
            vec![Position {
                file: "J.jcl".to_string(),
                begin_line: 1,
                code: None,
            }],
        )
        .unwrap();
    fx.graph
        .add_call(&step2.id, &fx.ftp.id, vec![position("J.jcl", 5, "GET A B")])
        .unwrap();

    let report = run(&mut fx.graph);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].caller, "STEP1");
    assert_eq!(report.failures[0].family, CommandFamily::Transfer);
    assert_eq!(fx.graph.links_from(&step2.id).len(), 2);
}

#[test]
fn test_placeholders_go_to_step_without_container() {
    let mut graph = MemoryGraph::new();
    let ftp = graph.add_object("FTP", "CAST_JCL_CatalogedProcedure", None).unwrap();
    let step = graph.add_object("STEP1", STEP, None).unwrap();
    graph
        .add_call(&step.id, &ftp.id, vec![position("J.jcl", 1, "PUT X.Y")])
        .unwrap();

    run(&mut graph);

    let links = graph.links_from(&step.id);
    let dataset = graph.get_object(&links[0].target).unwrap();
    assert_eq!(dataset.parent.as_deref(), Some(step.id.as_str()));
}

/// Host wrapper that refuses to create links from one caller.
struct FailingHost {
    inner: MemoryGraph,
    failing_caller: ObjectId,
}

impl HostGraph for FailingHost {
    fn objects_of_types(&self, types: &[String]) -> Result<Vec<HostObject>> {
        self.inner.objects_of_types(types)
    }

    fn call_links(&self, caller_type: &str, callees: &[ObjectId]) -> Result<Vec<CallLink>> {
        self.inner.call_links(caller_type, callees)
    }

    fn create_object(&mut self, object: NewObject) -> Result<HostObject> {
        self.inner.create_object(object)
    }

    fn create_link(&mut self, edge: &ReferenceEdge) -> Result<()> {
        if edge.source == self.failing_caller {
            return Err(DsnLinksError::Host {
                message: "store unavailable".to_string(),
                operation: "create_link".to_string(),
            });
        }
        self.inner.create_link(edge)
    }
}

#[test]
fn test_failing_link_does_not_stop_the_others() {
    let mut fx = setup();
    let mut steps = Vec::new();
    for (i, code) in ["GET FIRST.DS", "GET SECOND.DS", "&&DSNTHIRD.DS"]
        .iter()
        .enumerate()
    {
        let step = fx
            .graph
            .add_object(&format!("STEP{}", i + 1), STEP, None)
            .unwrap();
        let callee = if i == 2 { &fx.cdsend.id } else { &fx.ftp.id };
        fx.graph
            .add_call(&step.id, callee, vec![position("J.jcl", 1, code)])
            .unwrap();
        steps.push(step);
    }

    let mut host = FailingHost {
        inner: fx.graph,
        failing_caller: steps[1].id.clone(),
    };
    let report = DatasetLinker::new(&mut host, LinkerConfig::default())
        .run()
        .unwrap();

    assert_eq!(report.links_scanned, 3);
    assert_eq!(report.edges_created, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].caller, "STEP2");
    assert!(report.failures[0].message.contains("store unavailable"));

    let graph = &host.inner;
    assert_eq!(graph.links_from(&steps[0].id).len(), 1);
    assert!(graph.links_from(&steps[1].id).is_empty());
    let third = graph.links_from(&steps[2].id);
    assert_eq!(third.len(), 1);
    assert_eq!(graph.get_object(&third[0].target).unwrap().name, "THIRD.DS");
}

#[test]
fn test_trait_object_host() {
    let mut fx = setup();
    let step = fx.graph.add_object("STEP1", STEP, None).unwrap();
    fx.graph
        .add_call(&step.id, &fx.ftp.id, vec![position("J.jcl", 1, "PUT A")])
        .unwrap();

    let host: &mut dyn HostGraph = &mut fx.graph;
    let report = DatasetLinker::new(host, LinkerConfig::default()).run().unwrap();
    assert_eq!(report.edges_created, 1);
}
