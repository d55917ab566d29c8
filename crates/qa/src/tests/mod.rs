mod answer_flow;
