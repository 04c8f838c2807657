pub(crate) mod certificates;
pub(crate) mod code_judge;
pub(crate) mod exam_flow;
pub(crate) mod quiz_gate;
pub(crate) mod scoring;
